//! Events and the listener registry.

use std::{cell::Cell, rc::Rc};

use crate::dom::{Document, NodeId, SharedDocument};

/// The keys the page reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Closes the innermost open dialog.
    Escape,
    /// Moves focus, trapped inside an open dialog.
    Tab,
    /// Activates a focused row.
    Enter,
    /// Activates a focused row.
    Space,
    /// Any other key, by name.
    Other(String),
}

impl Key {
    /// Map a key name, as reported by a browser's `KeyboardEvent.key`, to a [Key].
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Self::Escape,
            "Tab" => Self::Tab,
            "Enter" => Self::Enter,
            " " | "Space" | "Spacebar" => Self::Space,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// The kinds of events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// [Event::Click]
    Click,
    /// [Event::KeyDown]
    KeyDown,
    /// [Event::Change]
    Change,
}

/// A user interaction delivered to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The element was clicked.
    Click {
        /// The clicked element.
        target: NodeId,
    },
    /// The value of a form control changed, e.g. a radio was selected.
    Change {
        /// The form control whose value changed.
        target: NodeId,
    },
    /// A key was pressed while `target` had focus.
    KeyDown {
        /// The focused element.
        target: NodeId,
        /// The key pressed.
        key: Key,
        /// Whether shift was held.
        shift: bool,
    },
}

impl Event {
    /// A click on `target`.
    pub fn click(target: NodeId) -> Self {
        Self::Click { target }
    }

    /// A change of the value of `target`.
    pub fn change(target: NodeId) -> Self {
        Self::Change { target }
    }

    /// `key` pressed on `target` without shift.
    pub fn key_down(target: NodeId, key: Key) -> Self {
        Self::KeyDown {
            target,
            key,
            shift: false,
        }
    }

    /// `key` pressed on `target` with shift held.
    pub fn shift_key_down(target: NodeId, key: Key) -> Self {
        Self::KeyDown {
            target,
            key,
            shift: true,
        }
    }

    /// The element the event happened on.
    pub fn target(&self) -> NodeId {
        match self {
            Self::Click { target } | Self::Change { target } | Self::KeyDown { target, .. } => {
                *target
            }
        }
    }

    /// The kind of listener that receives the event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Click { .. } => EventKind::Click,
            Self::Change { .. } => EventKind::Change,
            Self::KeyDown { .. } => EventKind::KeyDown,
        }
    }
}

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Where a listener receives events from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every event in the document.
    Document,
    /// Events whose target is the element or one of its descendants.
    Subtree(NodeId),
}

/// A registered interest in one kind of event.
///
/// `owner` is the element of the component that registered the listener and
/// is used to route the event back to that component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listener {
    /// Identifies the registration.
    pub id: ListenerId,
    /// Which events reach the listener.
    pub scope: Scope,
    /// The kind of event listened for.
    pub kind: EventKind,
    /// The element of the component that registered the listener.
    pub owner: NodeId,
}

impl Document {
    fn add_listener(&mut self, scope: Scope, kind: EventKind, owner: NodeId) -> ListenerId {
        self.purge_retired_listeners();

        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;

        self.listeners.push(Listener {
            id,
            scope,
            kind,
            owner,
        });

        id
    }

    fn purge_retired_listeners(&mut self) {
        let retired = self.retired.take();
        self.listeners.retain(|listener| !retired.contains(&listener.id));
    }

    /// The registered listeners, without those whose [Subscription] was
    /// dropped.
    fn live_listeners(&self) -> impl Iterator<Item = &Listener> {
        let retired = self.retired.take();
        let live = self
            .listeners
            .iter()
            .filter(|listener| !retired.contains(&listener.id))
            .collect::<Vec<_>>();
        self.retired.set(retired);

        live.into_iter()
    }

    /// The listeners that should receive `event`, in registration order.
    ///
    /// The result is a snapshot: listeners added or removed while the event
    /// is being handled do not affect its delivery.
    pub fn listeners_for(&self, event: &Event) -> Vec<Listener> {
        let target = event.target();

        self.live_listeners()
            .filter(|listener| listener.kind == event.kind())
            .filter(|listener| match listener.scope {
                Scope::Document => true,
                Scope::Subtree(root) => self.contains(root, target),
            })
            .copied()
            .collect()
    }

    /// How many listeners of `kind` are registered for `owner`.
    pub fn listener_count(&self, owner: NodeId, kind: EventKind) -> usize {
        self.live_listeners()
            .filter(|listener| listener.owner == owner && listener.kind == kind)
            .count()
    }
}

/// A listener registration that is removed when dropped.
///
/// Dropping only records the listener as retired, so it works even while
/// the document is borrowed; retired listeners are never delivered to.
pub struct Subscription {
    retired: Rc<Cell<Vec<ListenerId>>>,
    id: ListenerId,
}

impl Subscription {
    /// Register a listener on `document`.
    ///
    /// # Panics
    /// Panics if `document` is already borrowed.
    pub fn new(document: &SharedDocument, scope: Scope, kind: EventKind, owner: NodeId) -> Self {
        let mut document = document.borrow_mut();
        let id = document.add_listener(scope, kind, owner);

        Self {
            retired: document.retired.clone(),
            id,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut retired = self.retired.take();
        retired.push(self.id);
        self.retired.set(retired);
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::{Document, Event, EventKind, Key, Scope, Subscription};

    #[test]
    fn listeners_for_respects_scope_and_kind() {
        let mut document = Document::parse(
            r#"<div id="modal"><button id="inside">x</button></div><button id="outside">y</button>"#,
        );
        let modal = document.element_by_id("modal").unwrap();
        let inside = document.element_by_id("inside").unwrap();
        let outside = document.element_by_id("outside").unwrap();

        let keys = document.add_listener(Scope::Document, EventKind::KeyDown, modal);
        let clicks = document.add_listener(Scope::Subtree(modal), EventKind::Click, modal);

        let ids = |event: &Event, document: &Document| {
            document
                .listeners_for(event)
                .into_iter()
                .map(|listener| listener.id)
                .collect::<Vec<_>>()
        };

        assert_eq!(ids(&Event::click(inside), &document), vec![clicks]);
        assert!(ids(&Event::click(outside), &document).is_empty());
        assert_eq!(ids(&Event::key_down(outside, Key::Escape), &document), vec![keys]);
    }

    #[test]
    fn dropping_subscription_removes_listener() {
        let document = Document::parse(r#"<div id="modal"></div>"#).into_shared();
        let modal = document.borrow().element_by_id("modal").unwrap();

        let subscription = Subscription::new(&document, Scope::Document, EventKind::KeyDown, modal);
        assert_eq!(document.borrow().listener_count(modal, EventKind::KeyDown), 1);

        drop(subscription);
        assert_eq!(document.borrow().listener_count(modal, EventKind::KeyDown), 0);
    }

    #[test]
    fn dropping_subscription_while_the_document_is_borrowed_still_removes_it() {
        let document = Document::parse(r#"<div id="modal"><button id="inside">x</button></div>"#)
            .into_shared();
        let (modal, inside) = {
            let document = document.borrow();
            (
                document.element_by_id("modal").unwrap(),
                document.element_by_id("inside").unwrap(),
            )
        };
        let subscription =
            Subscription::new(&document, Scope::Subtree(modal), EventKind::Click, modal);

        {
            let _borrowed = document.borrow_mut();
            drop(subscription);
        }

        let document = document.borrow();
        assert_eq!(document.listener_count(modal, EventKind::Click), 0);
        assert!(document.listeners_for(&Event::click(inside)).is_empty());
    }

    #[test]
    fn key_names_map_to_keys() {
        assert_eq!(Key::from_name("Escape"), Key::Escape);
        assert_eq!(Key::from_name(" "), Key::Space);
        assert_eq!(Key::from_name("a"), Key::Other("a".to_owned()));
    }
}
