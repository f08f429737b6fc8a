//! Drill-down dialogs for a bank analysis results page.
//!
//! Clicking a row of the monthly summary opens a dialog that fetches and
//! shows the expense breakdown for that period. Clicking (or pressing Enter
//! or Space on) a breakdown row opens a nested dialog listing the
//! transactions behind it. Changing the breakdown style while the dialog is
//! open fetches the breakdown again without reopening it.
//!
//! The page runs against an in-memory [dom::Document]; data comes from any
//! [fetch::Fetch] implementation, e.g. the HTTP sources in [fetch].

#![warn(missing_docs)]

pub mod config;
pub mod details;
pub mod dialog;
pub mod dom;
pub mod fetch;
mod html;
pub mod orchestrator;
pub mod page;
pub mod savings;
pub mod surface;
pub mod templates;
pub mod transactions;

#[cfg(test)]
mod test_utils;

pub use config::{DialogConfig, PageConfig, SavingsConfig, ServiceConfig};
pub use details::{BreakdownStyle, CategoryTotal, DetailsKey, DetailsView, Period};
pub use dialog::Dialog;
pub use dom::{Document, Event, Key, NodeId, SharedDocument};
pub use fetch::{Fetch, FetchError, Field, HttpDetailsSource, HttpTransactionsSource};
pub use orchestrator::{FetchOrchestrator, RunOutcome};
pub use page::{Dispatched, ResultsPage};
pub use surface::{ContentState, ContentSurface, SurfaceView};
pub use transactions::{TransactionRecord, TransactionsKey, TransactionsView};

/// The errors that may occur while setting up the page.
///
/// Nothing that happens after the page is mounted is an error for the
/// caller: failed fetches are rendered into the dialogs instead.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An element the page needs is not in the document.
    ///
    /// The string describes the element, e.g. `#details-modal`.
    #[error("could not find the element {0} in the document")]
    MissingElement(String),

    /// The config file could not be read.
    #[error("could not read the config file {0}")]
    ConfigRead(String),

    /// The config could not be parsed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A service URL could not be parsed.
    ///
    /// Callers should pass in the offending URL and the parser's error.
    #[error("invalid URL \"{0}\": {1}")]
    InvalidUrl(String, String),

    /// A selector built from the page config is not valid CSS.
    #[error("invalid selector {0}")]
    InvalidSelector(String),

    /// The HTTP client could not be created.
    #[error("could not create the HTTP client: {0}")]
    HttpClient(String),
}
