//! A headless, in-memory host document.
//!
//! The dialogs and content surfaces only need a few capabilities from their
//! host: element lookup, a visibility marker class, event subscriptions,
//! focus and HTML injection. [Document] provides them on top of the tree
//! `scraper` parses, so the page logic can run and be tested without a
//! browser.

mod events;

pub use events::{Event, EventKind, Key, Listener, ListenerId, Scope, Subscription};

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    iter,
    rc::Rc,
};

use ego_tree::NodeRef;
use html5ever::{Attribute, LocalName, QualName, ns, tendril::StrTendril};
use scraper::{CaseSensitivity, ElementRef, Html, Node, Selector, node::Element};

use crate::Error;

/// A document shared between the dialogs, surfaces and the page wiring.
///
/// Everything runs on one thread, so a `RefCell` is enough. Borrows must
/// never be held across an `.await`.
pub type SharedDocument = Rc<RefCell<Document>>;

/// The marker class that hides an element.
const HIDDEN_CLASS: &str = "hidden";

type TreeId = ego_tree::NodeId;

/// Parse a CSS selector, e.g. one built from the page config.
///
/// # Errors
/// Returns [Error::InvalidSelector] if `css` is not a valid selector.
pub fn selector(css: &str) -> Result<Selector, Error> {
    Selector::parse(css).map_err(|error| Error::InvalidSelector(format!("{css:?}: {error}")))
}

/// Identifies an element or text node in a [Document].
///
/// The storage of nodes removed by [Document::set_inner_html] is reused.
/// An ID taken before the removal keeps reading as detached, it never
/// refers to the node that took its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    node: TreeId,
    generation: u32,
}

/// An HTML document held in memory.
pub struct Document {
    html: Html,
    generations: HashMap<TreeId, u32>,
    free: Vec<TreeId>,
    root: NodeId,
    body: NodeId,
    active: Option<NodeId>,
    modal_depth: HashMap<String, usize>,
    listeners: Vec<Listener>,
    retired: Rc<Cell<Vec<ListenerId>>>,
    next_listener_id: u64,
}

impl Document {
    /// Parse `html` into a new document.
    ///
    /// Missing `<html>`, `<head>` and `<body>` elements are added by the
    /// parser, so fragments are accepted too.
    pub fn parse(html: &str) -> Self {
        let html = Html::parse_document(html);

        let root = html.root_element();
        let body = root
            .child_elements()
            .find(|element| element.value().name() == "body")
            .unwrap_or(root);
        let (root, body) = (root.id(), body.id());

        Self {
            html,
            generations: HashMap::new(),
            free: Vec::new(),
            root: NodeId {
                node: root,
                generation: 0,
            },
            body: NodeId {
                node: body,
                generation: 0,
            },
            active: None,
            modal_depth: HashMap::new(),
            listeners: Vec::new(),
            retired: Rc::default(),
            next_listener_id: 0,
        }
    }

    /// Wrap the document so it can be shared by the page components.
    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    /// The `<html>` element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `<body>` element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    fn handle(&self, node: TreeId) -> NodeId {
        NodeId {
            node,
            generation: self.generations.get(&node).copied().unwrap_or_default(),
        }
    }

    /// The tree node behind `id`, unless it has been removed since.
    fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        if self.handle(id.node) != id {
            return None;
        }

        self.html.tree.get(id.node)
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.node(id).and_then(ElementRef::wrap)
    }

    /// Whether `id` is connected to the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Whether `id` is `ancestor` or sits somewhere below it.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.node(ancestor).is_some()
            && self.node(id).is_some_and(|node| {
                iter::once(node)
                    .chain(node.ancestors())
                    .any(|node| node.id() == ancestor.node)
            })
    }

    /// The element descendants of `id` in document order, excluding `id`.
    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.element(id)
            .map(|element| {
                element
                    .descendent_elements()
                    .skip(1)
                    .map(|element| self.handle(element.id()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The lowercase tag name of an element, or `None` for text nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.value().name())
    }

    /// The value of the attribute `name` on `id`.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    /// Whether `id` has the attribute `name`.
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set the attribute `name` on `id`. Text nodes are left alone.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        self.edit_attributes(id, |attributes| {
            let value = StrTendril::from_slice(value);

            match attributes
                .iter_mut()
                .find(|attribute| &*attribute.name.local == name)
            {
                Some(attribute) => attribute.value = value,
                None => attributes.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(name)),
                    value,
                }),
            }
        });
    }

    fn remove_attribute(&mut self, id: NodeId, name: &str) {
        self.edit_attributes(id, |attributes| {
            attributes.retain(|attribute| &*attribute.name.local != name);
        });
    }

    fn edit_attributes(&mut self, id: NodeId, edit: impl FnOnce(&mut Vec<Attribute>)) {
        if self.element(id).is_none() {
            return;
        }
        let Some(mut node) = self.html.tree.get_mut(id.node) else {
            return;
        };
        let Node::Element(element) = node.value() else {
            return;
        };

        let mut attributes = element
            .attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: name.clone(),
                value: StrTendril::from_slice(value),
            })
            .collect::<Vec<_>>();
        edit(&mut attributes);

        // Rebuilt rather than patched: the element caches its id and classes.
        *element = Element::new(element.name.clone(), attributes);
    }

    /// Whether `id` carries `class`.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|element| {
            element
                .value()
                .has_class(class, CaseSensitivity::CaseSensitive)
        })
    }

    fn add_class(&mut self, id: NodeId, class: &str) {
        if self.tag(id).is_none() || self.has_class(id, class) {
            return;
        }

        let classes = match self.attribute(id, "class") {
            Some(classes) if !classes.trim().is_empty() => format!("{} {class}", classes.trim()),
            _ => class.to_owned(),
        };
        self.set_attribute(id, "class", &classes);
    }

    fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(classes) = self.attribute(id, "class") else {
            return;
        };

        let remaining = classes
            .split_whitespace()
            .filter(|&name| name != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(id, "class", &remaining);
    }

    /// Apply the visibility marker to `id`.
    pub fn hide(&mut self, id: NodeId) {
        self.add_class(id, HIDDEN_CLASS);
    }

    /// Remove the visibility marker from `id`.
    pub fn show(&mut self, id: NodeId) {
        self.remove_class(id, HIDDEN_CLASS);
    }

    /// Whether `id` itself carries the visibility marker.
    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.has_class(id, HIDDEN_CLASS)
    }

    /// Set or clear the visibility marker on `id`.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if hidden {
            self.hide(id);
        } else {
            self.show(id);
        }
    }

    /// Whether `id` is attached and no element from it up to the root is
    /// display-suppressed.
    fn is_rendered(&self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };

        self.is_attached(id)
            && iter::once(node)
                .chain(node.ancestors())
                .all(|node| !self.is_display_suppressed(self.handle(node.id())))
    }

    fn is_display_suppressed(&self, id: NodeId) -> bool {
        self.is_hidden(id)
            || self.has_attribute(id, "hidden")
            || self.attribute(id, "style").is_some_and(|style| {
                style
                    .split(';')
                    .filter_map(|declaration| declaration.split_once(':'))
                    .any(|(property, value)| {
                        property.trim() == "display" && value.trim() == "none"
                    })
            })
    }

    /// Apply the "modal active" marker `class` to `<body>`.
    ///
    /// Calls are counted per class; the marker stays until every
    /// [Document::enter_modal] has been matched by [Document::leave_modal].
    pub fn enter_modal(&mut self, class: &str) {
        *self.modal_depth.entry(class.to_owned()).or_default() += 1;
        self.add_class(self.body, class);
    }

    /// Release one "modal active" marker taken by [Document::enter_modal].
    pub fn leave_modal(&mut self, class: &str) {
        let depth = self.modal_depth.entry(class.to_owned()).or_default();
        *depth = depth.saturating_sub(1);

        if *depth == 0 {
            self.remove_class(self.body, class);
        }
    }

    /// Move focus to `id`. Returns false if `id` is not an attached element.
    pub fn focus(&mut self, id: NodeId) -> bool {
        if self.tag(id).is_none() || !self.is_attached(id) {
            return false;
        }

        self.active = Some(id);
        true
    }

    /// The focused element, if it is still attached.
    pub fn active_element(&self) -> Option<NodeId> {
        self.active.filter(|&id| self.is_attached(id))
    }

    /// Whether `id` is an element the user can reach with Tab, ignoring
    /// visibility.
    fn is_focusable(&self, id: NodeId) -> bool {
        let Some(tag) = self.tag(id) else {
            return false;
        };

        if let Some(tab_index) = self.attribute(id, "tabindex") {
            return tab_index.trim().parse::<i32>().is_ok_and(|index| index >= 0);
        }

        match tag {
            "a" => self.has_attribute(id, "href"),
            "input" => {
                !self.has_attribute(id, "disabled") && self.attribute(id, "type") != Some("hidden")
            }
            "button" | "select" | "textarea" => !self.has_attribute(id, "disabled"),
            _ => false,
        }
    }

    fn is_tabbable(&self, id: NodeId) -> bool {
        self.is_focusable(id) && self.is_rendered(id)
    }

    /// The tabbable elements below `root` in document order.
    pub fn tabbable_within(&self, root: NodeId) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.is_tabbable(id))
            .collect()
    }

    /// Perform the default Tab navigation: move focus to the next (or
    /// previous) tabbable element in document order, wrapping at the ends.
    pub fn focus_sequential(&mut self, backwards: bool) -> Option<NodeId> {
        let order = self.descendants(self.root);
        let first = order.iter().copied().find(|&id| self.is_tabbable(id))?;
        let last = order.iter().copied().rfind(|&id| self.is_tabbable(id))?;

        let position = self
            .active_element()
            .and_then(|active| order.iter().position(|&id| id == active));

        let next = match (position, backwards) {
            (None, false) => first,
            (None, true) => last,
            (Some(position), false) => order[position + 1..]
                .iter()
                .copied()
                .find(|&id| self.is_tabbable(id))
                .unwrap_or(first),
            (Some(position), true) => order[..position]
                .iter()
                .copied()
                .rfind(|&id| self.is_tabbable(id))
                .unwrap_or(last),
        };

        self.focus(next);
        Some(next)
    }

    /// Whether the element `id` matches `selector`. Text nodes never match.
    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        self.element(id)
            .is_some_and(|element| selector.matches(&element))
    }

    /// The first element below `root`, in document order, matching `selector`.
    pub fn query_selector(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        let root = self.element(root)?;
        let found = root.select(selector).next()?;
        Some(self.handle(found.id()))
    }

    /// Every element below `root`, in document order, matching `selector`.
    pub fn query_selector_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.element(root)
            .map(|root| {
                root.select(selector)
                    .map(|element| self.handle(element.id()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `id` or its nearest ancestor matching `selector`.
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        let node = self.node(id)?;

        iter::once(node)
            .chain(node.ancestors())
            .filter_map(ElementRef::wrap)
            .find(|element| selector.matches(element))
            .map(|element| self.handle(element.id()))
    }

    /// Look up an attached element by its `id` attribute.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.element(self.root)?
            .descendent_elements()
            .find(|element| element.value().id() == Some(id))
            .map(|element| self.handle(element.id()))
    }

    /// Mark the radio `id` as checked and clear the other radios that share
    /// its name.
    pub fn check(&mut self, id: NodeId) {
        if let Some(name) = self.attribute(id, "name").map(str::to_owned) {
            let group = self
                .descendants(self.root)
                .into_iter()
                .filter(|&radio| {
                    self.tag(radio) == Some("input")
                        && self.attribute(radio, "name") == Some(name.as_str())
                })
                .collect::<Vec<_>>();

            for radio in group {
                self.remove_attribute(radio, "checked");
            }
        }

        self.set_attribute(id, "checked", "");
    }

    /// The value of the first checked element matching `radios`, if any.
    pub fn checked_value(&self, radios: &Selector) -> Option<&str> {
        self.element(self.root)?
            .select(radios)
            .find(|radio| radio.attr("checked").is_some())?
            .attr("value")
    }

    /// Replace the children of `id` with the nodes parsed from `html`.
    ///
    /// The previous children are released: anything holding on to them
    /// (e.g. a saved focus target) sees them as no longer attached, and
    /// their storage is reused for the new nodes.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        let Some(element) = self.element(id) else {
            return;
        };

        let previous = element.children().map(|child| child.id()).collect::<Vec<_>>();
        for child in previous {
            self.release(child);
        }

        let fragment = Html::parse_fragment(html);
        self.graft(id.node, *fragment.root_element());
    }

    /// Detach the subtree at `node` and put its nodes on the free list.
    fn release(&mut self, node: TreeId) {
        let Some(subtree) = self.html.tree.get(node) else {
            return;
        };
        let subtree = subtree.descendants().map(|node| node.id()).collect::<Vec<_>>();

        for id in subtree {
            if let Some(mut node) = self.html.tree.get_mut(id) {
                node.detach();
                *node.value() = Node::Fragment;
            }

            let generation = self.generations.entry(id).or_default();
            *generation = generation.wrapping_add(1);
            self.free.push(id);
        }
    }

    /// Copy the element and text children of `source` below `parent`.
    fn graft(&mut self, parent: TreeId, source: NodeRef<'_, Node>) {
        for child in source.children() {
            let value = child.value();
            if !(value.is_element() || value.is_text()) {
                continue;
            }

            if let Some(id) = self.insert(parent, value.clone()) {
                self.graft(id, child);
            }
        }
    }

    fn insert(&mut self, parent: TreeId, value: Node) -> Option<TreeId> {
        let Some(slot) = self.free.pop() else {
            return Some(self.html.tree.get_mut(parent)?.append(value).id());
        };

        *self.html.tree.get_mut(slot)?.value() = value;
        Some(self.html.tree.get_mut(parent)?.append_id(slot).id())
    }

    /// Serialize the children of `id` as HTML.
    pub fn inner_html(&self, id: NodeId) -> String {
        self.element(id)
            .map(|element| element.inner_html())
            .unwrap_or_default()
    }

    /// The concatenated text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        self.element(id)
            .map(|element| element.text().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, NodeId, selector};

    const PAGE: &str = r#"
        <html><body>
            <button id="before">Before</button>
            <div id="panel" class="panel">
                <a id="link" href="/x">Link</a>
                <a id="anchor">Not a link</a>
                <input id="text" type="text">
                <input id="secret" type="hidden">
                <button id="disabled" disabled>Disabled</button>
                <div id="tabbable" tabindex="0">Row</div>
                <div id="untabbable" tabindex="-1">Root</div>
                <div class="hidden"><button id="inside-hidden">Hidden</button></div>
                <div style="display: none"><button id="inside-none">None</button></div>
            </div>
            <button id="after">After</button>
        </body></html>
    "#;

    const SUMMARY: &str = r#"
        <table id="summary">
            <tr class="summary-row" data-period="2024-02"><td id="feb">Feb</td></tr>
            <tr class="summary-row selected" data-period="2024-03"><td id="mar">Mar</td></tr>
        </table>
    "#;

    fn element(document: &Document, id: &str) -> NodeId {
        document
            .element_by_id(id)
            .unwrap_or_else(|| panic!("missing #{id}"))
    }

    #[test]
    fn parse_builds_queryable_tree() {
        let document = Document::parse(PAGE);

        let panel = element(&document, "panel");
        assert_eq!(document.tag(panel), Some("div"));
        assert!(document.has_class(panel, "panel"));
        assert_eq!(document.attribute(element(&document, "link"), "href"), Some("/x"));
        assert_eq!(document.tag(document.body()), Some("body"));
    }

    #[test]
    fn selectors_match_against_the_live_tree() {
        let mut document = Document::parse(SUMMARY);
        let rows = selector(".summary-row[data-period=\"2024-03\"]").unwrap();

        let found = document.query_selector_all(document.root(), &rows);
        assert_eq!(found.len(), 1);
        assert!(document.has_class(found[0], "selected"));

        document.hide(found[0]);
        let hidden_rows = selector(".summary-row.hidden").unwrap();
        assert_eq!(document.query_selector(document.root(), &hidden_rows), Some(found[0]));
    }

    #[test]
    fn closest_walks_up_from_target_including_itself() {
        let document = Document::parse(SUMMARY);
        let cell = element(&document, "feb");

        let row = document.closest(cell, &selector(".summary-row").unwrap()).unwrap();

        assert_eq!(document.attribute(row, "data-period"), Some("2024-02"));
        assert_eq!(document.closest(cell, &selector(".missing").unwrap()), None);
        assert_eq!(document.closest(cell, &selector("td").unwrap()), Some(cell));
    }

    #[test]
    fn invalid_selector_is_an_error() {
        assert!(selector(".summary-row[").is_err());
    }

    #[test]
    fn tabbable_within_skips_non_interactive_and_hidden_elements() {
        let document = Document::parse(PAGE);
        let panel = element(&document, "panel");

        let tabbable = document.tabbable_within(panel);

        let expected = ["link", "text", "tabbable"].map(|id| element(&document, id));
        assert_eq!(tabbable, expected);
    }

    #[test]
    fn class_operations_keep_other_classes() {
        let mut document = Document::parse(PAGE);
        let panel = element(&document, "panel");

        document.add_class(panel, "open");
        document.add_class(panel, "open");
        assert_eq!(document.attribute(panel, "class"), Some("panel open"));

        document.remove_class(panel, "panel");
        assert_eq!(document.attribute(panel, "class"), Some("open"));
        assert!(!document.has_class(panel, "panel"));
    }

    #[test]
    fn hidden_marker_suppresses_rendering_of_descendants() {
        let mut document = Document::parse(PAGE);
        let panel = element(&document, "panel");
        let link = element(&document, "link");

        document.hide(panel);

        assert!(document.is_hidden(panel));
        assert!(!document.is_rendered(link));

        document.show(panel);
        assert!(document.is_rendered(link));
    }

    #[test]
    fn set_inner_html_replaces_and_detaches_children() {
        let mut document = Document::parse(PAGE);
        let panel = element(&document, "panel");
        let link = element(&document, "link");
        document.focus(link);

        document.set_inner_html(panel, "<p>Loading <strong>2024-03</strong></p>");

        assert!(!document.is_attached(link));
        assert_eq!(document.active_element(), None);
        assert_eq!(
            document.inner_html(panel),
            "<p>Loading <strong>2024-03</strong></p>"
        );
        assert_eq!(document.text_content(panel), "Loading 2024-03");
    }

    #[test]
    fn inner_html_escapes_text_and_attributes() {
        let mut document = Document::parse("<div id=\"target\"></div>");
        let target = element(&document, "target");

        document.set_inner_html(target, "<span title=\"a &quot;b&quot;\">1 &lt; 2 &amp; 3</span>");

        assert_eq!(
            document.inner_html(target),
            "<span title=\"a &quot;b&quot;\">1 &lt; 2 &amp; 3</span>"
        );
    }

    #[test]
    fn repeated_injection_reuses_released_nodes() {
        let mut document = Document::parse("<div id=\"target\"></div>");
        let target = element(&document, "target");
        let table = "<table><tbody><tr class=\"row\"><td>Rent</td><td>900.00</td></tr></tbody></table>";

        document.set_inner_html(target, table);
        let size = document.html.tree.nodes().count();

        for _ in 0..1000 {
            document.set_inner_html(target, "<p class=\"loading\">Loading...</p>");
            document.set_inner_html(target, table);
        }

        assert_eq!(document.html.tree.nodes().count(), size);
        assert_eq!(document.text_content(target), "Rent900.00");
    }

    #[test]
    fn ids_of_released_nodes_never_see_their_replacements() {
        let mut document = Document::parse("<div id=\"target\"><button id=\"old\">Old</button></div>");
        let target = element(&document, "target");
        let old = element(&document, "old");

        document.set_inner_html(target, "<button id=\"new\">New</button>");
        let new = element(&document, "new");

        assert_ne!(old, new);
        assert!(!document.is_attached(old));
        assert_eq!(document.tag(old), None);
        assert!(!document.focus(old));
        assert!(document.focus(new));
    }

    #[test]
    fn focus_sequential_follows_document_order_and_wraps() {
        let mut document = Document::parse(PAGE);
        let before = element(&document, "before");
        let after = element(&document, "after");
        document.focus(before);

        assert_eq!(document.focus_sequential(false), Some(element(&document, "link")));
        assert_eq!(document.focus_sequential(true), Some(before));
        assert_eq!(document.focus_sequential(true), Some(after));
        assert_eq!(document.focus_sequential(false), Some(before));
    }

    #[test]
    fn check_clears_other_radios_in_group() {
        let mut document = Document::parse(
            r#"
            <input type="radio" name="mode" value="total" id="total" checked>
            <input type="radio" name="mode" value="other" id="other">
            "#,
        );
        let radios = selector("input[name=\"mode\"]").unwrap();
        assert_eq!(document.checked_value(&radios), Some("total"));

        let other = element(&document, "other");
        document.check(other);

        assert_eq!(document.checked_value(&radios), Some("other"));
        assert!(!document.has_attribute(element(&document, "total"), "checked"));
    }

    #[test]
    fn modal_marker_is_counted() {
        let mut document = Document::parse(PAGE);
        let body = document.body();

        document.enter_modal("modal-open");
        document.enter_modal("modal-open");
        document.leave_modal("modal-open");
        assert!(document.has_class(body, "modal-open"));

        document.leave_modal("modal-open");
        assert!(!document.has_class(body, "modal-open"));
    }
}
