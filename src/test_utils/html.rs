use scraper::{ElementRef, Html, Selector};

use crate::dom::{NodeId, SharedDocument};

/// Parse the markup below `id` in `document` so it can be queried with selectors.
pub(crate) fn parse_html_fragment(document: &SharedDocument, id: NodeId) -> Html {
    Html::parse_fragment(&document.borrow().inner_html(id))
}

pub(crate) fn parse_html_document(text: &str) -> Html {
    Html::parse_document(text)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}

#[track_caller]
pub(crate) fn select_all<'a>(html: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    let selector = Selector::parse(selector).unwrap();
    html.select(&selector).collect()
}

/// The trimmed text of each element matching `selector`.
#[track_caller]
pub(crate) fn select_texts(html: &Html, selector: &str) -> Vec<String> {
    select_all(html, selector)
        .into_iter()
        .map(|element| element.text().collect::<String>().trim().to_owned())
        .collect()
}

#[track_caller]
pub(crate) fn assert_table_headers(html: &Html, want: &[&str]) {
    let headers = select_texts(html, "thead th");

    assert_eq!(headers, want, "want table headers {want:?}, got {headers:?}");
}
