//! Configuration for the page wiring and the data services.
//!
//! Every struct has a [Default] matching the markup produced by
//! [crate::templates], and can be loaded from JSON where any missing field
//! falls back to its default.

use std::{fs, path::Path};

use serde::{Deserialize, Deserializer};

use crate::Error;

const DETAILS_MODAL_ID: &str = "details-modal";
const TRANSACTIONS_MODAL_ID: &str = "transactions-modal";

/// The ids and class names a dialog is built from.
///
/// In a [PageConfig] each dialog is read as overrides of the defaults for
/// its own modal, so a partial entry never falls back to the other
/// dialog's `modal_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogConfig {
    /// The `id` of the modal element, which also hosts the backdrop.
    pub modal_id: String,
    /// The class of the dialog element inside the modal that receives focus.
    pub dialog_class: String,
    /// The attribute that marks close controls, e.g. `data-close`.
    pub close_attribute: String,
    /// The class of the backdrop element.
    pub backdrop_class: String,
    /// The class put on `<body>` while the dialog is open.
    pub body_open_class: String,
}

impl DialogConfig {
    /// The defaults for a modal with the given `id`.
    pub fn for_modal(modal_id: &str) -> Self {
        Self {
            modal_id: modal_id.to_owned(),
            ..Default::default()
        }
    }
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            modal_id: DETAILS_MODAL_ID.to_owned(),
            dialog_class: "modal-dialog".to_owned(),
            close_attribute: "data-close".to_owned(),
            backdrop_class: "modal-backdrop".to_owned(),
            body_open_class: "modal-open".to_owned(),
        }
    }
}

/// The fields of a [DialogConfig] that a config file sets.
#[derive(Debug, Default, Deserialize)]
struct DialogOverrides {
    modal_id: Option<String>,
    dialog_class: Option<String>,
    close_attribute: Option<String>,
    backdrop_class: Option<String>,
    body_open_class: Option<String>,
}

impl DialogOverrides {
    fn apply(self, defaults: DialogConfig) -> DialogConfig {
        DialogConfig {
            modal_id: self.modal_id.unwrap_or(defaults.modal_id),
            dialog_class: self.dialog_class.unwrap_or(defaults.dialog_class),
            close_attribute: self.close_attribute.unwrap_or(defaults.close_attribute),
            backdrop_class: self.backdrop_class.unwrap_or(defaults.backdrop_class),
            body_open_class: self.body_open_class.unwrap_or(defaults.body_open_class),
        }
    }
}

fn details_dialog<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DialogConfig, D::Error> {
    let overrides = DialogOverrides::deserialize(deserializer)?;
    Ok(overrides.apply(DialogConfig::for_modal(DETAILS_MODAL_ID)))
}

fn transactions_dialog<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DialogConfig, D::Error> {
    let overrides = DialogOverrides::deserialize(deserializer)?;
    Ok(overrides.apply(DialogConfig::for_modal(TRANSACTIONS_MODAL_ID)))
}

/// The names used by the savings column toggle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SavingsConfig {
    /// The `name` of the radios choosing the savings mode.
    pub mode_input: String,
    /// The class shared by the savings column headers.
    pub header_class: String,
    /// The class shared by the savings column cells.
    pub cell_class: String,
    /// The class of the "total savings" column.
    pub total_class: String,
    /// The class of the "savings vs. theoretical" column.
    pub vs_theoretical_class: String,
}

impl Default for SavingsConfig {
    fn default() -> Self {
        Self {
            mode_input: "savings_mode".to_owned(),
            header_class: "savings-header".to_owned(),
            cell_class: "savings-cell".to_owned(),
            total_class: "savings-total".to_owned(),
            vs_theoretical_class: "savings-vs-theoretical".to_owned(),
        }
    }
}

/// Where the page's controllers find their elements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// The top-level dialog showing the breakdown for a period.
    #[serde(deserialize_with = "details_dialog")]
    pub details_dialog: DialogConfig,
    /// The nested dialog listing the transactions behind a breakdown row.
    #[serde(deserialize_with = "transactions_dialog")]
    pub transactions_dialog: DialogConfig,
    /// The `id` of the element the breakdown is rendered into.
    pub details_body_id: String,
    /// The `id` of the element the transactions are rendered into.
    pub transactions_body_id: String,
    /// The class of the rows in the monthly summary table.
    pub summary_row_class: String,
    /// The class of the rows in the rendered breakdown table.
    pub details_row_class: String,
    /// The `name` of the radios choosing the breakdown style.
    pub breakdown_style_input: String,
    /// The savings column toggle.
    pub savings: SavingsConfig,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            details_dialog: DialogConfig::for_modal(DETAILS_MODAL_ID),
            transactions_dialog: DialogConfig::for_modal(TRANSACTIONS_MODAL_ID),
            details_body_id: "details-modal-body".to_owned(),
            transactions_body_id: "transactions-modal-body".to_owned(),
            summary_row_class: "summary-row".to_owned(),
            details_row_class: "details-row".to_owned(),
            breakdown_style_input: "breakdown_style".to_owned(),
            savings: SavingsConfig::default(),
        }
    }
}

impl PageConfig {
    /// Load the config from a JSON file.
    ///
    /// # Errors
    /// Returns [Error::ConfigRead] if the file cannot be read and
    /// [Error::InvalidConfig] if it is not valid JSON for this struct.
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)
            .map_err(|error| Error::ConfigRead(format!("{}: {error}", path.display())))?;

        Self::from_json(&text)
    }

    /// Parse the config from JSON text.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if `text` is not valid JSON for this struct.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|error| Error::InvalidConfig(error.to_string()))
    }
}

/// Where the breakdown and transaction data is fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// The server's base URL, e.g. `http://localhost:10000`.
    pub base_url: String,
    /// The path of the breakdown endpoint, relative to `base_url`.
    pub details_path: String,
    /// The path of the transactions endpoint, relative to `base_url`.
    pub transactions_path: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:10000".to_owned(),
            details_path: "/details".to_owned(),
            transactions_path: "/transactions".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, config::PageConfig};

    #[test]
    fn missing_fields_use_defaults() {
        let config = PageConfig::from_json(
            r#"{"details_body_id": "breakdown", "transactions_dialog": {"modal_id": "tx"}}"#,
        )
        .unwrap();

        assert_eq!(config.details_body_id, "breakdown");
        assert_eq!(config.transactions_dialog.modal_id, "tx");
        assert_eq!(config.transactions_dialog.close_attribute, "data-close");
        assert_eq!(config.details_dialog.modal_id, "details-modal");
        assert_eq!(config.savings.mode_input, "savings_mode");
    }

    #[test]
    fn partial_dialog_entries_keep_their_own_modal() {
        let config =
            PageConfig::from_json(r#"{"transactions_dialog": {"backdrop_class": "tx-backdrop"}}"#)
                .unwrap();

        assert_eq!(config.transactions_dialog.modal_id, "transactions-modal");
        assert_eq!(config.transactions_dialog.backdrop_class, "tx-backdrop");
        assert_eq!(config.transactions_dialog.dialog_class, "modal-dialog");
        assert_eq!(config.details_dialog.modal_id, "details-modal");
        assert_ne!(config.details_dialog.modal_id, config.transactions_dialog.modal_id);
    }

    #[test]
    fn invalid_json_is_rejected() {
        let result = PageConfig::from_json("{not json");

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
