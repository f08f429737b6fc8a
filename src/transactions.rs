//! The transactions behind one row of the breakdown.

use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    details::Period,
    fetch::{Field, amount_cell, plain_cell},
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, loading_spinner},
    surface::SurfaceView,
};

/// Which transactions to list: those of `period` grouped under `label`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionsKey {
    /// The period of the breakdown the row belongs to.
    pub period: Period,
    /// The row's label, e.g. a category name.
    pub label: String,
    /// What the label refers to, e.g. `category`. May be empty.
    pub kind: String,
}

/// One transaction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionRecord {
    /// When the transaction was made.
    pub date: Option<Field>,
    /// The bank's description of the transaction.
    pub message: Option<Field>,
    /// The transaction's category, shown as the row's tooltip.
    pub category: Option<Field>,
    /// The signed amount.
    pub amount: Option<Field>,
    /// Who was paid.
    pub supplier: Option<Field>,
}

/// The transactions markup.
#[derive(Debug, Clone, Default)]
pub struct TransactionsView;

impl SurfaceView for TransactionsView {
    type Key = TransactionsKey;
    type Record = TransactionRecord;

    fn loading(&self, key: &TransactionsKey) -> Markup {
        html! {
            p class="loading" {
                (loading_spinner())
                "Loading transactions for " (key.period.as_str()) " [" (key.kind) ":" (key.label) "]..."
            }
        }
    }

    fn error(&self, _key: &TransactionsKey, cause: Option<&str>) -> Markup {
        html! {
            p class="error text-red-500" {
                "Unable to load transactions."
                @if let Some(cause) = cause {
                    " " (cause)
                }
            }
        }
    }

    fn empty(&self) -> Markup {
        html! {
            p class="empty" { "No transactions for this selection." }
        }
    }

    fn table(&self, _key: &TransactionsKey, records: &[TransactionRecord]) -> Markup {
        html! {
            table class="w-full text-sm text-left"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Message" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Supplier" }
                    }
                }

                tbody
                {
                    @for record in records {
                        tr class=(TABLE_ROW_STYLE) title=(plain_cell(record.category.as_ref()))
                        {
                            td class=(TABLE_CELL_STYLE) { (plain_cell(record.date.as_ref())) }
                            td class=(TABLE_CELL_STYLE) { (plain_cell(record.message.as_ref())) }
                            td class=(TABLE_CELL_STYLE) { (amount_cell(record.amount.as_ref())) }
                            td class=(TABLE_CELL_STYLE) { (plain_cell(record.supplier.as_ref())) }
                        }
                    }
                }
            }
        }
    }
}
