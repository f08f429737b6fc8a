//! Modal dialogs: open/close lifecycle, focus trapping and focus restoration.
//!
//! A dialog knows nothing about the content it shows. While open it holds two
//! subscriptions, global key presses (Escape and Tab) and clicks inside the
//! modal (close controls and the backdrop), and releases both when closed.

mod focus_trap;

use std::cell::RefCell;

use scraper::Selector;

use crate::{
    Error,
    config::DialogConfig,
    dialog::focus_trap::{TrapAction, trap_tab},
    dom::{Event, EventKind, Key, NodeId, Scope, SharedDocument, Subscription, selector},
};

enum DialogState {
    Closed,
    Open {
        /// The element focused before the dialog opened. Read once on close.
        last_focused: Option<NodeId>,
        /// Dropping these removes the listeners added by `open`.
        _subscriptions: [Subscription; 2],
    },
}

/// A modal dialog on the page.
pub struct Dialog {
    document: SharedDocument,
    config: DialogConfig,
    close_controls: Selector,
    modal: NodeId,
    content: NodeId,
    state: RefCell<DialogState>,
}

impl Dialog {
    /// Find the dialog described by `config` in `document`.
    ///
    /// The dialog starts closed, so the modal is hidden if the markup did not
    /// already hide it.
    ///
    /// # Errors
    /// Returns [Error::MissingElement] if the modal or its dialog element
    /// cannot be found, and [Error::InvalidSelector] if the configured class
    /// or close attribute cannot be used in a selector.
    pub fn mount(document: &SharedDocument, config: &DialogConfig) -> Result<Self, Error> {
        let dialog_element = selector(&format!(".{}", config.dialog_class))?;
        let close_controls = selector(&format!("[{}]", config.close_attribute))?;

        let (modal, content) = {
            let mut document = document.borrow_mut();

            let modal = document
                .element_by_id(&config.modal_id)
                .ok_or_else(|| Error::MissingElement(format!("#{}", config.modal_id)))?;
            let content = document
                .query_selector(modal, &dialog_element)
                .ok_or_else(|| {
                    Error::MissingElement(format!("#{} .{}", config.modal_id, config.dialog_class))
                })?;

            document.hide(modal);
            (modal, content)
        };

        Ok(Self {
            document: document.clone(),
            config: config.clone(),
            close_controls,
            modal,
            content,
            state: RefCell::new(DialogState::Closed),
        })
    }

    /// The modal element, which also owns the dialog's listeners.
    pub fn modal(&self) -> NodeId {
        self.modal
    }

    /// The element that receives focus when the dialog opens.
    pub fn content(&self) -> NodeId {
        self.content
    }

    /// Whether the dialog is showing.
    pub fn is_open(&self) -> bool {
        matches!(*self.state.borrow(), DialogState::Open { .. })
    }

    /// Show the dialog and move focus into it.
    ///
    /// Returns false, doing nothing, if the dialog is already open.
    pub fn open(&self) -> bool {
        if self.is_open() {
            return false;
        }

        let last_focused = {
            let mut document = self.document.borrow_mut();
            let last_focused = document.active_element();

            document.show(self.modal);
            document.enter_modal(&self.config.body_open_class);
            document.set_attribute(self.content, "tabindex", "-1");
            document.focus(self.content);

            last_focused
        };

        let subscriptions = [
            Subscription::new(&self.document, Scope::Document, EventKind::KeyDown, self.modal),
            Subscription::new(
                &self.document,
                Scope::Subtree(self.modal),
                EventKind::Click,
                self.modal,
            ),
        ];

        *self.state.borrow_mut() = DialogState::Open {
            last_focused,
            _subscriptions: subscriptions,
        };

        tracing::debug!("Opened dialog #{}", self.config.modal_id);
        true
    }

    /// Hide the dialog and give focus back to the element that had it
    /// before [Dialog::open], if that element is still on the page.
    ///
    /// Returns false, doing nothing, if the dialog is already closed.
    pub fn close(&self) -> bool {
        let previous = self.state.replace(DialogState::Closed);
        let DialogState::Open {
            last_focused,
            _subscriptions: subscriptions,
        } = previous
        else {
            return false;
        };

        drop(subscriptions);

        let mut document = self.document.borrow_mut();
        document.hide(self.modal);
        document.leave_modal(&self.config.body_open_class);

        match last_focused {
            Some(target) if document.is_attached(target) => {
                document.focus(target);
            }
            Some(_) => tracing::debug!(
                "Not restoring focus for #{}: the element is no longer on the page",
                self.config.modal_id
            ),
            None => {}
        }

        tracing::debug!("Closed dialog #{}", self.config.modal_id);
        true
    }

    /// React to an event delivered through one of the dialog's listeners.
    ///
    /// Returns true if the event's default action (Tab navigation) must be
    /// prevented.
    pub fn handle(&self, event: &Event) -> bool {
        if !self.is_open() {
            return false;
        }

        match event {
            Event::KeyDown {
                key: Key::Escape, ..
            } => {
                self.close();
                false
            }
            Event::KeyDown {
                key: Key::Tab,
                shift,
                ..
            } => self.trap_focus(*shift),
            Event::Click { target } => {
                if self.is_close_target(*target) {
                    self.close();
                }
                false
            }
            _ => false,
        }
    }

    fn trap_focus(&self, backwards: bool) -> bool {
        let mut document = self.document.borrow_mut();
        let focusable = document.tabbable_within(self.content);

        match trap_tab(&focusable, document.active_element(), backwards) {
            TrapAction::MoveTo(target) => {
                document.focus(target);
                true
            }
            TrapAction::Allow => false,
        }
    }

    /// Whether a click on `target` should close the dialog: the target is (or
    /// sits inside) a close control of this modal, or is the backdrop itself.
    fn is_close_target(&self, target: NodeId) -> bool {
        let document = self.document.borrow();

        let on_close_control = document
            .closest(target, &self.close_controls)
            .is_some_and(|control| document.contains(self.modal, control));

        on_close_control || document.has_class(target, &self.config.backdrop_class)
    }
}
