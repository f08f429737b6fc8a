//! The fetch capability the dialogs get their data from.
//!
//! A [Fetch] implementation takes a request key and asynchronously returns
//! the records for it. The HTTP sources in this module talk to the results
//! server; tests use in-memory sources.

mod http;

pub use http::{HttpDetailsSource, HttpTransactionsSource};

use serde::Deserialize;

/// Asynchronously fetches the records for a request key.
pub trait Fetch {
    /// What is being asked for, e.g. a period.
    type Key;
    /// One row of the answer.
    type Record;

    /// Start fetching the records for `key`.
    ///
    /// This is called once per run, in the order the runs start; the
    /// returned future resolves with the outcome. `Ok(None)` means the source
    /// answered with no data at all (a JSON `null`), which is shown the same
    /// way as an empty list.
    fn fetch(
        &self,
        key: Self::Key,
    ) -> impl Future<Output = Result<Option<Vec<Self::Record>>, FetchError>>;
}

/// Why a fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or the response could not be read.
    #[error("{0}")]
    Network(String),

    /// The server answered with a non-success status code.
    #[error("HTTP {0}")]
    Status(u16),

    /// The response body was not the expected JSON.
    #[error("could not decode the response: {0}")]
    Decode(String),
}

/// A loosely-typed field of a fetched record.
///
/// The server's records are not validated, so a field that should be a
/// number may arrive as text (or anything else). Rendering never fails:
/// values that are not numbers are shown as they are.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Field {
    /// A JSON number.
    Number(f64),
    /// A JSON string.
    Text(String),
    /// Anything else, including `null`.
    Other(serde_json::Value),
}

impl Field {
    /// Format the field for a money column: numbers get two decimal places,
    /// anything else is shown raw.
    pub fn to_amount_string(&self) -> String {
        match self {
            Field::Number(number) => format!("{number:.2}"),
            other => other.to_plain_string(),
        }
    }

    /// Format the field as-is.
    pub fn to_plain_string(&self) -> String {
        match self {
            Field::Number(number) => number.to_string(),
            Field::Text(text) => text.clone(),
            Field::Other(serde_json::Value::Null) => String::new(),
            Field::Other(value) => value.to_string(),
        }
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Field::Number(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Text(value.to_owned())
    }
}

/// The text for a table cell; missing fields are empty.
pub(crate) fn plain_cell(field: Option<&Field>) -> String {
    field.map(Field::to_plain_string).unwrap_or_default()
}

/// The text for a money cell; missing fields are empty.
pub(crate) fn amount_cell(field: Option<&Field>) -> String {
    field.map(Field::to_amount_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Field, amount_cell, plain_cell};

    #[test]
    fn numbers_in_money_columns_have_two_decimals() {
        assert_eq!(Field::from(12.5).to_amount_string(), "12.50");
        assert_eq!(Field::from(-3.0).to_amount_string(), "-3.00");
        assert_eq!(Field::from(0.126).to_amount_string(), "0.13");
    }

    #[test]
    fn malformed_numbers_fall_back_to_raw_text() {
        assert_eq!(Field::from("12,50 €").to_amount_string(), "12,50 €");
        assert_eq!(Field::Other(json!(true)).to_amount_string(), "true");
    }

    #[test]
    fn missing_and_null_fields_are_empty() {
        assert_eq!(plain_cell(None), "");
        assert_eq!(amount_cell(None), "");
        assert_eq!(Field::Other(json!(null)).to_plain_string(), "");
    }

    #[test]
    fn integers_render_without_decimals_in_plain_cells() {
        let field: Field = serde_json::from_value(json!(3)).unwrap();

        assert_eq!(field.to_plain_string(), "3");
    }

    #[test]
    fn untagged_fields_pick_the_matching_variant() {
        let fields: Vec<Field> = serde_json::from_value(json!([1.5, "text", [1, 2]])).unwrap();

        assert_eq!(
            fields,
            vec![
                Field::Number(1.5),
                Field::Text("text".to_owned()),
                Field::Other(json!([1, 2]))
            ]
        );
    }
}
