//! Switches the summary table between its two savings columns.

use scraper::Selector;

use crate::{
    Error,
    config::SavingsConfig,
    dom::{SharedDocument, selector},
};

/// Which savings column the summary table shows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SavingsMode {
    /// The amount saved in the period.
    #[default]
    Total,
    /// The amount saved compared to the theoretical savings.
    VsTheoretical,
}

impl SavingsMode {
    /// Parse the value of a savings mode radio.
    ///
    /// Unknown values fall back to [SavingsMode::Total].
    pub fn from_value(value: &str) -> Self {
        match value {
            "total" => Self::Total,
            "vs_theoretical" => Self::VsTheoretical,
            other => {
                tracing::warn!("Unknown savings mode {other:?}, showing total savings");
                Self::Total
            }
        }
    }
}

/// Shows the savings column chosen by the `savings_mode` radios and hides
/// the other one.
pub struct SavingsToggle {
    document: SharedDocument,
    radios: Selector,
    total_column: Selector,
    vs_theoretical_column: Selector,
}

impl SavingsToggle {
    /// Control the columns named in `config`.
    ///
    /// # Errors
    /// Returns [Error::InvalidSelector] if a configured name or class cannot
    /// be used in a selector.
    pub fn new(document: &SharedDocument, config: &SavingsConfig) -> Result<Self, Error> {
        let column = |class: &str| {
            selector(&format!(
                ".{class}.{header}, .{class}.{cell}",
                header = config.header_class,
                cell = config.cell_class
            ))
        };

        Ok(Self {
            document: document.clone(),
            radios: selector(&format!("input[name=\"{}\"]", config.mode_input))?,
            total_column: column(&config.total_class)?,
            vs_theoretical_column: column(&config.vs_theoretical_class)?,
        })
    }

    /// The mode selected by the radios, [SavingsMode::Total] if none is checked.
    pub fn mode(&self) -> SavingsMode {
        self.document
            .borrow()
            .checked_value(&self.radios)
            .map(SavingsMode::from_value)
            .unwrap_or_default()
    }

    /// Matches the radios that choose the mode.
    pub fn radios(&self) -> &Selector {
        &self.radios
    }

    /// Hide the header and cells of the column that is not selected and
    /// show the others. Returns the applied mode.
    pub fn update(&self) -> SavingsMode {
        let mode = self.mode();
        let show_total = mode == SavingsMode::Total;

        let mut document = self.document.borrow_mut();
        let root = document.root();

        for (column, hidden) in [
            (&self.total_column, !show_total),
            (&self.vs_theoretical_column, show_total),
        ] {
            for element in document.query_selector_all(root, column) {
                document.set_hidden(element, hidden);
            }
        }

        tracing::debug!("Showing savings column {mode:?}");
        mode
    }
}
