//! The region of a dialog that shows fetched content.
//!
//! A [ContentSurface] is always in exactly one [ContentState]. Every render
//! operation replaces the container's content wholesale.

use std::{
    cell::{Ref, RefCell},
    fmt,
};

use maud::Markup;

use crate::{
    Error,
    dom::{NodeId, SharedDocument},
    fetch::FetchError,
};

/// The markup a surface shows for each of its states.
pub trait SurfaceView {
    /// Identifies what is being shown.
    type Key: Clone + PartialEq + fmt::Debug;
    /// One row of the fetched data.
    type Record;

    /// Shown while the data for `key` is being fetched.
    fn loading(&self, key: &Self::Key) -> Markup;

    /// Shown when fetching `key` failed. `cause` is a printable form of the
    /// failure, if there is one.
    fn error(&self, key: &Self::Key, cause: Option<&str>) -> Markup;

    /// Shown when the fetch succeeded but returned no rows.
    fn empty(&self) -> Markup;

    /// One table row per record. `records` is never empty.
    fn table(&self, key: &Self::Key, records: &[Self::Record]) -> Markup;
}

/// What a surface is currently showing.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentState<K, R> {
    /// Nothing has been requested yet.
    Idle,
    /// Waiting on the data for the key.
    Loading(K),
    /// The data for the key, possibly empty.
    Success(K, Vec<R>),
    /// Fetching the key failed for the given reason.
    Error(K, String),
}

/// Renders content into one container element.
pub struct ContentSurface<V: SurfaceView> {
    document: SharedDocument,
    container: NodeId,
    view: V,
    state: RefCell<ContentState<V::Key, V::Record>>,
}

impl<V: SurfaceView> ContentSurface<V> {
    /// Render into `container`, starting in [ContentState::Idle].
    pub fn new(document: &SharedDocument, container: NodeId, view: V) -> Self {
        Self {
            document: document.clone(),
            container,
            view,
            state: RefCell::new(ContentState::Idle),
        }
    }

    /// Render into the element with the `id` attribute `container_id`.
    ///
    /// # Errors
    /// Returns [Error::MissingElement] if there is no such element.
    pub fn mount(document: &SharedDocument, container_id: &str, view: V) -> Result<Self, Error> {
        let container = document
            .borrow()
            .element_by_id(container_id)
            .ok_or_else(|| Error::MissingElement(format!("#{container_id}")))?;

        Ok(Self::new(document, container, view))
    }

    /// The element the content is rendered into.
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// The current state. Do not hold on to it across a render.
    pub fn state(&self) -> Ref<'_, ContentState<V::Key, V::Record>> {
        self.state.borrow()
    }

    /// Show the loading indicator for `key`.
    pub fn show_loading(&self, key: &V::Key) {
        self.inject(self.view.loading(key));
        *self.state.borrow_mut() = ContentState::Loading(key.clone());
    }

    /// Show the failure message for `key`, with `cause` if given.
    pub fn show_error(&self, key: &V::Key, cause: Option<&FetchError>) {
        let cause = cause.map(ToString::to_string);
        self.inject(self.view.error(key, cause.as_deref()));
        *self.state.borrow_mut() = ContentState::Error(key.clone(), cause.unwrap_or_default());
    }

    /// Show the "nothing to show" message.
    ///
    /// This does not change the state: it is the rendering of an empty
    /// [ContentState::Success], which [ContentSurface::render] records.
    pub fn show_empty(&self) {
        self.inject(self.view.empty());
    }

    /// Render `records` for `key`. `None` and an empty list both show the
    /// empty message.
    pub fn render(&self, key: &V::Key, records: Option<Vec<V::Record>>) {
        let records = records.unwrap_or_default();

        if records.is_empty() {
            self.show_empty();
        } else {
            self.inject(self.view.table(key, &records));
        }

        *self.state.borrow_mut() = ContentState::Success(key.clone(), records);
    }

    fn inject(&self, markup: Markup) {
        self.document
            .borrow_mut()
            .set_inner_html(self.container, &markup.into_string());
    }
}

#[cfg(test)]
mod tests {
    use maud::{Markup, html};

    use crate::{
        Error,
        dom::{Document, SharedDocument},
        fetch::FetchError,
        surface::{ContentState, ContentSurface, SurfaceView},
    };

    struct ListView;

    impl SurfaceView for ListView {
        type Key = u32;
        type Record = &'static str;

        fn loading(&self, key: &u32) -> Markup {
            html! { p { "loading " (key) } }
        }

        fn error(&self, key: &u32, cause: Option<&str>) -> Markup {
            html! { p { "error " (key) @if let Some(cause) = cause { ": " (cause) } } }
        }

        fn empty(&self) -> Markup {
            html! { p { "empty" } }
        }

        fn table(&self, _key: &u32, records: &[&'static str]) -> Markup {
            html! { ul { @for record in records { li { (record) } } } }
        }
    }

    fn mount() -> (SharedDocument, ContentSurface<ListView>) {
        let document = Document::parse(r#"<div id="content"><p id="old">old</p></div>"#).into_shared();
        let surface = ContentSurface::mount(&document, "content", ListView).unwrap();
        (document, surface)
    }

    fn shown(document: &SharedDocument, surface: &ContentSurface<ListView>) -> String {
        document.borrow().inner_html(surface.container())
    }

    #[test]
    fn starts_idle() {
        let (_document, surface) = mount();

        assert_eq!(*surface.state(), ContentState::Idle);
    }

    #[test]
    fn mount_fails_without_container() {
        let document = Document::parse("<div></div>").into_shared();

        let result = ContentSurface::mount(&document, "content", ListView);

        assert_eq!(result.err(), Some(Error::MissingElement("#content".to_owned())));
    }

    #[test]
    fn each_state_replaces_previous_content() {
        let (document, surface) = mount();
        let old = document.borrow().element_by_id("old").unwrap();

        surface.show_loading(&1);
        assert_eq!(shown(&document, &surface), "<p>loading 1</p>");
        assert_eq!(*surface.state(), ContentState::Loading(1));
        assert!(!document.borrow().is_attached(old));

        surface.render(&1, Some(vec!["a", "b"]));
        assert_eq!(shown(&document, &surface), "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(*surface.state(), ContentState::Success(1, vec!["a", "b"]));

        surface.show_error(&2, Some(&FetchError::Status(500)));
        assert_eq!(shown(&document, &surface), "<p>error 2: HTTP 500</p>");
        assert_eq!(
            *surface.state(),
            ContentState::Error(2, "HTTP 500".to_owned())
        );
    }

    #[test]
    fn error_without_cause_omits_it() {
        let (document, surface) = mount();

        surface.show_error(&3, None);

        assert_eq!(shown(&document, &surface), "<p>error 3</p>");
    }

    #[test]
    fn empty_and_absent_data_render_like_show_empty() {
        let (document, surface) = mount();
        surface.show_empty();
        let want = shown(&document, &surface);

        surface.render(&1, Some(vec![]));
        assert_eq!(shown(&document, &surface), want);
        assert_eq!(*surface.state(), ContentState::Success(1, vec![]));

        surface.render(&1, None);
        assert_eq!(shown(&document, &surface), want);
    }

    #[test]
    fn rendering_twice_is_idempotent() {
        let (document, surface) = mount();

        surface.render(&1, Some(vec!["a"]));
        let first = shown(&document, &surface);
        surface.render(&1, Some(vec!["a"]));

        assert_eq!(shown(&document, &surface), first);
    }
}
