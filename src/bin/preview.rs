use std::{error::Error, path::PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bank_drilldown::{
    BreakdownStyle, Document, Event, HttpDetailsSource, HttpTransactionsSource, PageConfig,
    Period, ResultsPage, ServiceConfig, SharedDocument,
    dom::selector,
    templates::{SummaryRow, results_page},
};

/// Open the breakdown dialog for one period against a running results
/// server and print what the dialog renders.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The results server's base URL.
    #[arg(long, default_value = "http://localhost:10000")]
    base_url: String,

    /// The period to open, e.g. `2024-03`.
    #[arg(long)]
    period: String,

    /// The breakdown style, `standard` or `enhanced`.
    #[arg(long)]
    style: Option<String>,

    /// File path to a JSON page config. Missing fields use the defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PageConfig::from_json_file(path)?,
        None => PageConfig::default(),
    };
    let service = ServiceConfig {
        base_url: args.base_url.clone(),
        ..Default::default()
    };

    let rows = [SummaryRow {
        period: Period::new(args.period.as_str()),
        savings_total: 0.0,
        savings_vs_theoretical: 0.0,
    }];
    let document = Document::parse(&results_page(&rows, &config).into_string()).into_shared();

    if let Some(style) = &args.style {
        select_style(&document, &config, BreakdownStyle::from_value(style))?;
    }

    let page = ResultsPage::mount(
        &document,
        &config,
        HttpDetailsSource::new(&service)?,
        HttpTransactionsSource::new(&service)?,
    )?;

    let summary_rows = selector(&format!(".{}", config.summary_row_class))?;
    let row = {
        let document = document.borrow();
        document
            .query_selector(document.root(), &summary_rows)
            .ok_or_else(|| format!("no summary row for {}", args.period))?
    };

    let dispatched = page.dispatch(&Event::click(row)).await;
    tracing::info!("Opened the breakdown for {}: {:?}", args.period, dispatched.run);

    let body = page.details().surface().container();
    println!("{}", document.borrow().inner_html(body));

    Ok(())
}

fn select_style(
    document: &SharedDocument,
    config: &PageConfig,
    style: BreakdownStyle,
) -> Result<(), bank_drilldown::Error> {
    let radio = selector(&format!(
        "input[name=\"{}\"][value=\"{}\"]",
        config.breakdown_style_input,
        style.as_str()
    ))?;

    let mut document = document.borrow_mut();
    if let Some(radio) = document.query_selector(document.root(), &radio) {
        document.check(radio);
    }

    Ok(())
}
