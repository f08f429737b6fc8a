//! Wires the results page's interactions to the dialogs and orchestrators.
//!
//! The page owns both dialogs and both orchestrators. Events are delivered
//! through [ResultsPage::dispatch], which plays the part of the browser's
//! event loop: it calls the listeners the dialogs registered, applies the
//! declarative bindings and performs default Tab navigation.

use std::{cell::Cell, pin::Pin};

use scraper::Selector;

use crate::{
    Error,
    config::PageConfig,
    details::{BreakdownStyle, CategoryTotal, DetailsKey, DetailsView, Period},
    dialog::Dialog,
    dom::{Event, Key, Listener, NodeId, Scope, SharedDocument, selector},
    fetch::Fetch,
    orchestrator::{FetchOrchestrator, RunOutcome},
    savings::SavingsToggle,
    surface::ContentSurface,
    transactions::{TransactionRecord, TransactionsKey, TransactionsView},
};

type PendingRun<'a> = Pin<Box<dyn Future<Output = RunOutcome> + 'a>>;

/// The interaction a binding reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Click,
    Change,
    /// Enter or Space pressed on the element.
    Activate,
}

impl Trigger {
    fn accepts(self, event: &Event) -> bool {
        match (self, event) {
            (Self::Click, Event::Click { .. }) | (Self::Change, Event::Change { .. }) => true,
            (Self::Activate, Event::KeyDown { key, .. }) => matches!(key, Key::Enter | Key::Space),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    OpenDetails,
    RefreshDetails,
    OpenTransactions,
    UpdateSavings,
}

/// Runs `action` when `trigger` happens on (or inside) an element matching
/// `targets`, optionally only inside the element `within`.
#[derive(Debug, Clone)]
struct Binding {
    trigger: Trigger,
    targets: Selector,
    within: Option<NodeId>,
    action: Action,
}

/// What [ResultsPage::dispatch] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    /// Whether a handler prevented the event's default action.
    pub default_prevented: bool,
    /// The outcome of the fetch the event started, if it started one.
    pub run: Option<RunOutcome>,
}

/// The drill-down dialogs of the results page.
pub struct ResultsPage<D, T>
where
    D: Fetch<Key = DetailsKey, Record = CategoryTotal>,
    T: Fetch<Key = TransactionsKey, Record = TransactionRecord>,
{
    document: SharedDocument,
    config: PageConfig,
    details_dialog: Dialog,
    transactions_dialog: Dialog,
    details: FetchOrchestrator<D, DetailsView>,
    transactions: FetchOrchestrator<T, TransactionsView>,
    savings: SavingsToggle,
    style_radios: Selector,
    bindings: Vec<Binding>,
    last_trigger: Cell<Option<NodeId>>,
}

impl<D, T> ResultsPage<D, T>
where
    D: Fetch<Key = DetailsKey, Record = CategoryTotal>,
    T: Fetch<Key = TransactionsKey, Record = TransactionRecord>,
{
    /// Find the page's dialogs and content containers, bind the page's
    /// interactions and apply the selected savings column.
    ///
    /// # Errors
    /// Returns [Error::MissingElement] if a dialog or content container
    /// named in `config` is not in `document`, and [Error::InvalidSelector]
    /// if a configured class or input name cannot be used in a selector.
    pub fn mount(
        document: &SharedDocument,
        config: &PageConfig,
        details_source: D,
        transactions_source: T,
    ) -> Result<Self, Error> {
        let details_dialog = Dialog::mount(document, &config.details_dialog)?;
        let transactions_dialog = Dialog::mount(document, &config.transactions_dialog)?;

        let details_surface = ContentSurface::mount(
            document,
            &config.details_body_id,
            DetailsView::new(&config.details_row_class),
        )?;
        let transactions_surface =
            ContentSurface::mount(document, &config.transactions_body_id, TransactionsView)?;

        let savings = SavingsToggle::new(document, &config.savings)?;
        let style_radios = selector(&format!(
            "input[name=\"{}\"]",
            config.breakdown_style_input
        ))?;
        let summary_rows = selector(&format!(".{}", config.summary_row_class))?;
        let details_rows = selector(&format!(".{}", config.details_row_class))?;

        let bindings = vec![
            Binding {
                trigger: Trigger::Click,
                targets: summary_rows,
                within: None,
                action: Action::OpenDetails,
            },
            Binding {
                trigger: Trigger::Change,
                targets: style_radios.clone(),
                within: None,
                action: Action::RefreshDetails,
            },
            Binding {
                trigger: Trigger::Click,
                targets: details_rows.clone(),
                within: Some(details_surface.container()),
                action: Action::OpenTransactions,
            },
            Binding {
                trigger: Trigger::Activate,
                targets: details_rows,
                within: Some(details_surface.container()),
                action: Action::OpenTransactions,
            },
            Binding {
                trigger: Trigger::Change,
                targets: savings.radios().clone(),
                within: None,
                action: Action::UpdateSavings,
            },
        ];

        savings.update();

        Ok(Self {
            document: document.clone(),
            config: config.clone(),
            details_dialog,
            transactions_dialog,
            details: FetchOrchestrator::new(details_source, details_surface),
            transactions: FetchOrchestrator::new(transactions_source, transactions_surface),
            savings,
            style_radios,
            bindings,
            last_trigger: Cell::new(None),
        })
    }

    /// The document the page is mounted on.
    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// The config the page was mounted with.
    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// The top-level dialog showing the breakdown of a period.
    pub fn details_dialog(&self) -> &Dialog {
        &self.details_dialog
    }

    /// The nested dialog listing the transactions behind a breakdown row.
    pub fn transactions_dialog(&self) -> &Dialog {
        &self.transactions_dialog
    }

    /// Fetches and renders the breakdown of a period.
    pub fn details(&self) -> &FetchOrchestrator<D, DetailsView> {
        &self.details
    }

    /// Fetches and renders the transactions behind a breakdown row.
    pub fn transactions(&self) -> &FetchOrchestrator<T, TransactionsView> {
        &self.transactions
    }

    /// The savings column toggle.
    pub fn savings(&self) -> &SavingsToggle {
        &self.savings
    }

    /// The summary row that last opened the details dialog.
    ///
    /// Focus is restored from [Dialog]'s own record; this is informational.
    pub fn last_trigger(&self) -> Option<NodeId> {
        self.last_trigger.get()
    }

    /// The breakdown style selected by the radios, standard if none is checked.
    pub fn breakdown_style(&self) -> BreakdownStyle {
        self.document
            .borrow()
            .checked_value(&self.style_radios)
            .map(BreakdownStyle::from_value)
            .unwrap_or_default()
    }

    /// Deliver `event` to the page.
    ///
    /// Everything up to the fetch happens before this returns: listeners
    /// scoped to the target's ancestors run first, then the page bindings,
    /// then document-wide listeners (the most recently opened dialog
    /// first), then default Tab navigation unless it was prevented. The
    /// returned future waits for the fetch the event started, if any.
    pub fn dispatch<'a>(
        &'a self,
        event: &Event,
    ) -> impl Future<Output = Dispatched> + use<'a, D, T> {
        let listeners = self.document.borrow().listeners_for(event);
        let (scoped, global): (Vec<Listener>, Vec<Listener>) = listeners
            .into_iter()
            .partition(|listener| matches!(listener.scope, Scope::Subtree(_)));

        let mut default_prevented = false;

        for listener in &scoped {
            default_prevented |= self.deliver(listener, event);
        }

        let (prevented, pending) = self.apply_bindings(event);
        default_prevented |= prevented;

        for listener in global.iter().rev() {
            default_prevented |= self.deliver(listener, event);
        }

        if let Event::KeyDown {
            key: Key::Tab,
            shift,
            ..
        } = event
            && !default_prevented
        {
            self.document.borrow_mut().focus_sequential(*shift);
        }

        async move {
            let run = match pending {
                Some(pending) => Some(pending.await),
                None => None,
            };

            Dispatched {
                default_prevented,
                run,
            }
        }
    }

    /// Hand `event` to the dialog that registered `listener`.
    fn deliver(&self, listener: &Listener, event: &Event) -> bool {
        [&self.details_dialog, &self.transactions_dialog]
            .into_iter()
            .find(|dialog| dialog.modal() == listener.owner)
            .is_some_and(|dialog| dialog.handle(event))
    }

    fn apply_bindings(&self, event: &Event) -> (bool, Option<PendingRun<'_>>) {
        let matched = {
            let document = self.document.borrow();

            self.bindings.iter().find_map(|binding| {
                if !binding.trigger.accepts(event) {
                    return None;
                }

                let element = document.closest(event.target(), &binding.targets)?;
                match binding.within {
                    Some(within) if !document.contains(within, element) => None,
                    _ => Some((binding.trigger, binding.action, element)),
                }
            })
        };

        let Some((trigger, action, element)) = matched else {
            return (false, None);
        };

        let pending = match action {
            Action::OpenDetails => self.open_details(element),
            Action::RefreshDetails => self.refresh_details(),
            Action::OpenTransactions => self.open_transactions(element),
            Action::UpdateSavings => {
                self.savings.update();
                None
            }
        };

        (trigger == Trigger::Activate, pending)
    }

    fn open_details(&self, row: NodeId) -> Option<PendingRun<'_>> {
        let period = self
            .document
            .borrow()
            .attribute(row, "data-period")
            .map(Period::new);
        let Some(period) = period else {
            tracing::warn!("Ignoring click on a summary row without a data-period attribute");
            return None;
        };

        self.last_trigger.set(Some(row));
        self.details_dialog.open();

        let key = DetailsKey::new(period, self.breakdown_style());
        Some(Box::pin(self.details.run(key)))
    }

    fn refresh_details(&self) -> Option<PendingRun<'_>> {
        if !self.details_dialog.is_open() {
            return None;
        }

        let current = self.details.current_key()?;
        let key = DetailsKey::new(current.period, self.breakdown_style());
        Some(Box::pin(self.details.run(key)))
    }

    fn open_transactions(&self, row: NodeId) -> Option<PendingRun<'_>> {
        let Some(current) = self.details.current_key() else {
            tracing::debug!("Ignoring details row activation before any breakdown was requested");
            return None;
        };

        let (label, kind) = {
            let document = self.document.borrow();
            (
                document.attribute(row, "data-label").map(str::to_owned),
                document
                    .attribute(row, "data-kind")
                    .unwrap_or_default()
                    .to_owned(),
            )
        };
        let Some(label) = label else {
            tracing::warn!("Ignoring details row without a data-label attribute");
            return None;
        };

        self.transactions_dialog.open();

        let key = TransactionsKey {
            period: current.period,
            label,
            kind,
        };
        Some(Box::pin(self.transactions.run(key)))
    }
}
