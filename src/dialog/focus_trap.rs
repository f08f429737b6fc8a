//! Keeps Tab navigation inside an open dialog.

use crate::dom::NodeId;

/// What a Tab key press should do inside an open dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrapAction {
    /// Let the default navigation move focus.
    Allow,
    /// Prevent the default navigation and focus this element instead.
    MoveTo(NodeId),
}

/// Decide how to handle Tab (or Shift+Tab when `backwards`) given the
/// dialog's tabbable elements in document order and the focused element.
///
/// Focus wraps from the last element to the first and back; anywhere else
/// the default navigation is left alone.
pub(crate) fn trap_tab(focusable: &[NodeId], active: Option<NodeId>, backwards: bool) -> TrapAction {
    let (Some(&first), Some(&last)) = (focusable.first(), focusable.last()) else {
        return TrapAction::Allow;
    };

    match active {
        Some(active) if backwards && active == first => TrapAction::MoveTo(last),
        Some(active) if !backwards && active == last => TrapAction::MoveTo(first),
        _ => TrapAction::Allow,
    }
}
