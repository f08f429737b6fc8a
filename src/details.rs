//! The expense breakdown shown in the details dialog.

use std::fmt;

use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    fetch::{Field, amount_cell, plain_cell},
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, loading_spinner},
    surface::SurfaceView,
};

/// A period of the analysis, e.g. `2024-03`, as written on the summary rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Period(String);

impl Period {
    /// Create a period from its token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The period token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How expenses are grouped in the breakdown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakdownStyle {
    /// Group by category only.
    #[default]
    Standard,
    /// Group by category and split out transfers and refunds.
    Enhanced,
}

impl BreakdownStyle {
    /// Parse the value of a breakdown style radio.
    ///
    /// Unknown values fall back to [BreakdownStyle::Standard].
    pub fn from_value(value: &str) -> Self {
        match value {
            "enhanced" => Self::Enhanced,
            "standard" => Self::Standard,
            other => {
                tracing::warn!("Unknown breakdown style {other:?}, using standard");
                Self::Standard
            }
        }
    }

    /// The value sent to the server and used by the radios.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for BreakdownStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which breakdown to show.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DetailsKey {
    /// The period the breakdown covers.
    pub period: Period,
    /// How the expenses are grouped.
    pub style: BreakdownStyle,
}

impl DetailsKey {
    /// The breakdown of `period` in `style`.
    pub fn new(period: Period, style: BreakdownStyle) -> Self {
        Self { period, style }
    }
}

/// One row of the breakdown: the total spent in a category.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CategoryTotal {
    /// The top-level category, also used as the row's label when drilling
    /// down into its transactions.
    pub category_parent: Option<Field>,
    /// The amount spent.
    pub total: Option<Field>,
    /// How many transactions make up the total.
    pub nb_operations: Option<Field>,
    /// What kind of grouping the label refers to, e.g. `category`.
    pub kind: Option<Field>,
}

/// The breakdown markup.
#[derive(Debug, Clone)]
pub struct DetailsView {
    row_class: String,
}

impl DetailsView {
    /// `row_class` is put on every body row so the rows can be bound to the
    /// transactions drill-down.
    pub fn new(row_class: &str) -> Self {
        Self {
            row_class: row_class.to_owned(),
        }
    }
}

impl Default for DetailsView {
    fn default() -> Self {
        Self::new("details-row")
    }
}

impl SurfaceView for DetailsView {
    type Key = DetailsKey;
    type Record = CategoryTotal;

    fn loading(&self, key: &DetailsKey) -> Markup {
        html! {
            p class="loading" {
                (loading_spinner())
                "Loading breakdown for " (key.period.as_str()) " (" (key.style.as_str()) ")..."
            }
        }
    }

    fn error(&self, key: &DetailsKey, cause: Option<&str>) -> Markup {
        html! {
            p class="error text-red-500" {
                "Unable to load details for " (key.period.as_str()) "."
                @if let Some(cause) = cause {
                    " " (cause)
                }
            }
        }
    }

    fn empty(&self) -> Markup {
        html! {
            p class="empty" { "No details available for this period." }
        }
    }

    fn table(&self, key: &DetailsKey, records: &[CategoryTotal]) -> Markup {
        html! {
            h3 class="text-lg font-semibold mb-2" { "Expense Breakdown for " (key.period.as_str()) }

            table class="w-full text-sm text-left"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Total" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "# Ops" }
                    }
                }

                tbody
                {
                    @for record in records {
                        @let label = plain_cell(record.category_parent.as_ref());
                        tr
                            class={ (self.row_class) " " (TABLE_ROW_STYLE) }
                            tabindex="0"
                            data-label=(label)
                            data-kind=(plain_cell(record.kind.as_ref()))
                        {
                            td class=(TABLE_CELL_STYLE) { (label) }
                            td class=(TABLE_CELL_STYLE) { (amount_cell(record.total.as_ref())) }
                            td class=(TABLE_CELL_STYLE) { (plain_cell(record.nb_operations.as_ref())) }
                        }
                    }
                }
            }
        }
    }
}
