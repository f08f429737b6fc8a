#![allow(missing_docs)]

pub(crate) mod html;
pub(crate) mod server;
pub(crate) mod sources;

pub(crate) use html::{
    assert_table_headers, assert_valid_html, parse_html_document, parse_html_fragment, select_all,
    select_texts,
};
pub(crate) use server::spawn_server;
pub(crate) use sources::{GatedSource, StubSource};
