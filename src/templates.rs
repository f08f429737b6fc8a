//! Markup for the results page the drill-down dialogs live on.
//!
//! The class names and ids come from [PageConfig], so a page built here can
//! always be mounted with the same config.

use maud::{Markup, html};

use crate::{
    config::{DialogConfig, PageConfig},
    details::{BreakdownStyle, Period},
    html::{
        BUTTON_CLOSE_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, MODAL_BACKDROP_STYLE, MODAL_DIALOG_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    savings::SavingsMode,
};

/// One row of the monthly summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    /// The period the row summarises; clicking the row opens its breakdown.
    pub period: Period,
    /// Income minus expenses over the period.
    pub savings_total: f64,
    /// The savings compared to what the budget predicted.
    pub savings_vs_theoretical: f64,
}

/// A hidden modal with a backdrop, a close button and an empty body that a
/// content surface renders into.
///
/// The close button is marked with `data-close`, the default close attribute.
pub fn modal(config: &DialogConfig, title: &str, body_id: &str) -> Markup {
    html! {
        div id=(config.modal_id) class="hidden fixed inset-0 z-50" role="dialog" aria-modal="true"
        {
            div class=(format!("{} {MODAL_BACKDROP_STYLE}", config.backdrop_class)) {}

            div class=(format!("{} {MODAL_DIALOG_STYLE}", config.dialog_class))
            {
                div class="flex items-center justify-between mb-4"
                {
                    h2 class="text-xl font-semibold" { (title) }

                    button
                        type="button"
                        class=(BUTTON_CLOSE_STYLE)
                        aria-label="Close"
                        data-close
                    {
                        "×"
                    }
                }

                div id=(body_id) {}
            }
        }
    }
}

fn radio_group<T: PartialEq + Copy>(
    name: &str,
    legend: &str,
    options: &[(T, &str, &str)],
    selected: T,
) -> Markup {
    html! {
        fieldset class=(FORM_RADIO_GROUP_STYLE)
        {
            legend class="sr-only" { (legend) }

            @for (option, value, label) in options {
                label class=(FORM_RADIO_LABEL_STYLE)
                {
                    input
                        type="radio"
                        class=(FORM_RADIO_INPUT_STYLE)
                        name=(name)
                        value=(value)
                        checked[*option == selected];
                    (label)
                }
            }
        }
    }
}

/// The radios choosing how the breakdown groups expenses.
pub fn breakdown_style_radios(name: &str, selected: BreakdownStyle) -> Markup {
    radio_group(
        name,
        "Breakdown style",
        &[
            (BreakdownStyle::Standard, "standard", "Standard"),
            (BreakdownStyle::Enhanced, "enhanced", "Enhanced"),
        ],
        selected,
    )
}

/// The radios choosing which savings column the summary table shows.
pub fn savings_mode_radios(name: &str, selected: SavingsMode) -> Markup {
    radio_group(
        name,
        "Savings",
        &[
            (SavingsMode::Total, "total", "Total savings"),
            (SavingsMode::VsTheoretical, "vs_theoretical", "Vs. theoretical"),
        ],
        selected,
    )
}

/// The monthly summary. Both savings columns are rendered; the one not
/// selected by default starts hidden.
pub fn summary_table(rows: &[SummaryRow], config: &PageConfig) -> Markup {
    let savings = &config.savings;
    let total_header = format!("{} {} {TABLE_CELL_STYLE}", savings.header_class, savings.total_class);
    let theo_header = format!(
        "{} {} hidden {TABLE_CELL_STYLE}",
        savings.header_class, savings.vs_theoretical_class
    );
    let total_cell = format!("{} {} {TABLE_CELL_STYLE}", savings.cell_class, savings.total_class);
    let theo_cell = format!(
        "{} {} hidden {TABLE_CELL_STYLE}",
        savings.cell_class, savings.vs_theoretical_class
    );

    html! {
        table class="w-full text-sm text-left"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Period" }
                    th scope="col" class=(total_header) { "Savings" }
                    th scope="col" class=(theo_header) { "Savings vs. theoretical" }
                }
            }

            tbody
            {
                @for row in rows {
                    tr
                        class={ (config.summary_row_class) " cursor-pointer " (TABLE_ROW_STYLE) }
                        data-period=(row.period.as_str())
                    {
                        td class=(TABLE_CELL_STYLE) { (row.period.as_str()) }
                        td class=(total_cell) { (format!("{:.2}", row.savings_total)) }
                        td class=(theo_cell) { (format!("{:.2}", row.savings_vs_theoretical)) }
                    }
                }
            }
        }
    }
}

/// The full results page: controls, summary table and both dialogs.
pub fn results_page(rows: &[SummaryRow], config: &PageConfig) -> Markup {
    let content = html! {
        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Monthly summary" }

            div class="flex flex-row gap-6 mb-4"
            {
                (breakdown_style_radios(&config.breakdown_style_input, BreakdownStyle::Standard))
                (savings_mode_radios(&config.savings.mode_input, SavingsMode::Total))
            }

            (summary_table(rows, config))
        }

        (modal(&config.details_dialog, "Details", &config.details_body_id))
        (modal(&config.transactions_dialog, "Transactions", &config.transactions_body_id))
    };

    base("Results", &content)
}
