//! In-memory [Fetch] implementations.

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    hash::Hash,
};

use tokio::sync::oneshot;

use crate::fetch::{Fetch, FetchError};

type Response<R> = Result<Option<Vec<R>>, FetchError>;

/// Answers immediately with a canned response per key and records each call.
///
/// Keys without a canned response get an empty list.
pub(crate) struct StubSource<K, R> {
    responses: HashMap<K, Response<R>>,
    calls: RefCell<Vec<K>>,
}

impl<K: Clone + Eq + Hash, R: Clone> StubSource<K, R> {
    pub(crate) fn new() -> Self {
        Self {
            responses: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn respond(mut self, key: K, response: Response<R>) -> Self {
        self.responses.insert(key, response);
        self
    }

    pub(crate) fn calls(&self) -> Vec<K> {
        self.calls.borrow().clone()
    }
}

impl<K: Clone + Eq + Hash, R: Clone> Fetch for StubSource<K, R> {
    type Key = K;
    type Record = R;

    fn fetch(&self, key: K) -> impl Future<Output = Response<R>> {
        let response = self
            .responses
            .get(&key)
            .cloned()
            .unwrap_or(Ok(Some(Vec::new())));
        self.calls.borrow_mut().push(key);

        async move { response }
    }
}

/// Answers each call only once the test sends the response through the
/// gate returned by [GatedSource::gate].
///
/// Gates for the same key are used in the order they were created.
pub(crate) struct GatedSource<K, R> {
    gates: RefCell<HashMap<K, VecDeque<oneshot::Receiver<Response<R>>>>>,
    calls: RefCell<Vec<K>>,
}

impl<K: Clone + Eq + Hash, R> GatedSource<K, R> {
    pub(crate) fn new() -> Self {
        Self {
            gates: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn gate(&self, key: K) -> oneshot::Sender<Response<R>> {
        let (sender, receiver) = oneshot::channel();
        self.gates
            .borrow_mut()
            .entry(key)
            .or_default()
            .push_back(receiver);
        sender
    }

    pub(crate) fn calls(&self) -> Vec<K> {
        self.calls.borrow().clone()
    }
}

impl<K: Clone + Eq + Hash, R> Fetch for GatedSource<K, R> {
    type Key = K;
    type Record = R;

    fn fetch(&self, key: K) -> impl Future<Output = Response<R>> {
        let receiver = self
            .gates
            .borrow_mut()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        self.calls.borrow_mut().push(key);

        async move {
            match receiver {
                Some(receiver) => receiver
                    .await
                    .unwrap_or_else(|_| Err(FetchError::Network("gate dropped".to_owned()))),
                None => Err(FetchError::Network("no gate for this key".to_owned())),
            }
        }
    }
}
