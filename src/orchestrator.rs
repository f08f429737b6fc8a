//! Drives a content surface through loading and into success or failure.
//!
//! Several runs may be in flight at once. Only the most recently started one
//! is allowed to change the surface once its fetch completes; results of
//! earlier runs are dropped.

use std::cell::{Cell, RefCell};

use crate::{
    fetch::Fetch,
    surface::{ContentSurface, SurfaceView},
};

/// What a call to [FetchOrchestrator::run] did to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The fetched records (or the empty message) were rendered.
    Rendered,
    /// The fetch failed and the error message was rendered.
    Failed,
    /// A later run started before this one finished; the surface was left alone.
    Discarded,
}

/// Fetches the data for a key and renders it into a surface.
pub struct FetchOrchestrator<F, V: SurfaceView> {
    source: F,
    surface: ContentSurface<V>,
    /// The key of the latest run and the generation it was started with.
    current: RefCell<Option<(u64, V::Key)>>,
    generation: Cell<u64>,
}

impl<F, V> FetchOrchestrator<F, V>
where
    F: Fetch<Key = V::Key, Record = V::Record>,
    V: SurfaceView,
{
    /// Render the data from `source` into `surface`.
    pub fn new(source: F, surface: ContentSurface<V>) -> Self {
        Self {
            source,
            surface,
            current: RefCell::new(None),
            generation: Cell::new(0),
        }
    }

    /// The surface the runs render into.
    pub fn surface(&self) -> &ContentSurface<V> {
        &self.surface
    }

    /// Where the records come from.
    pub fn source(&self) -> &F {
        &self.source
    }

    /// The key of the most recent run, if there has been one.
    pub fn current_key(&self) -> Option<V::Key> {
        self.current.borrow().as_ref().map(|(_, key)| key.clone())
    }

    /// Show the loading state for `key` and fetch its data.
    ///
    /// The loading state is shown, `key` becomes the current key and the
    /// fetch is started as soon as this is called. The returned future waits
    /// for the fetch and, if no other run was started in the meantime,
    /// renders the result or the error. It never fails: failures are
    /// rendered, not returned.
    pub fn run(&self, key: V::Key) -> impl Future<Output = RunOutcome> + '_ {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        self.surface.show_loading(&key);
        *self.current.borrow_mut() = Some((generation, key.clone()));
        let fetch = self.source.fetch(key.clone());

        async move {
            let result = fetch.await;

            if !self.is_current(generation) {
                tracing::debug!("Discarding stale result for {key:?}");
                return RunOutcome::Discarded;
            }

            match result {
                Ok(records) => {
                    self.surface.render(&key, records);
                    RunOutcome::Rendered
                }
                Err(error) => {
                    tracing::warn!("Could not fetch {key:?}: {error}");
                    self.surface.show_error(&key, Some(&error));
                    RunOutcome::Failed
                }
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|(current, _)| *current == generation)
    }
}
