use super::ui;
use crate::core::{ApiResponse, CurrencyCatalog, RateTable, rates::UpstreamError};
use crate::rates::RateClient;
use anyhow::Result;
use comfy_table::Cell;
use tracing::info;

pub fn render_table(title: &str, table: &RateTable, catalog: Option<&CurrencyCatalog>) -> String {
    let mut grid = ui::new_styled_table();
    grid.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Name"),
        ui::header_cell(&format!("Rate (1 {})", table.base)),
    ]);

    for (code, rate) in &table.rates {
        let name = catalog
            .and_then(|c| c.get(code))
            .cloned()
            .unwrap_or_default();
        grid.add_row(vec![Cell::new(code), Cell::new(name), ui::rate_cell(*rate)]);
    }

    let mut output = format!(
        "{} {}\n{}\n\n",
        ui::style_text(title, ui::StyleType::Title),
        ui::style_text(&format!("base {}", table.base), ui::StyleType::Label),
        ui::style_text(
            &format!("as of {}", table.timestamp.format("%Y-%m-%d %H:%M UTC")),
            ui::StyleType::Subtle
        ),
    );
    output.push_str(&grid.to_string());

    let attribution = ui::attribution(&table.disclaimer, &table.license);
    if !attribution.is_empty() {
        output.push_str("\n\n");
        output.push_str(&attribution);
    }
    output
}

pub fn render_error(err: &UpstreamError) -> String {
    let status = err.status.map_or(String::new(), |s| format!(" ({s})"));
    format!(
        "{}{}: {}",
        ui::style_text(&err.message, ui::StyleType::Error),
        status,
        err.description
    )
}

fn print_response(
    title: &str,
    response: &ApiResponse<RateTable>,
    catalog: Option<&CurrencyCatalog>,
) {
    match response {
        ApiResponse::Data(table) => println!("{}", render_table(title, table, catalog)),
        ApiResponse::Error(err) => println!("{}", render_error(err)),
    }
}

pub async fn run_latest(
    client: &mut RateClient,
    base: Option<&str>,
    skip_cache: bool,
) -> Result<()> {
    let response = client.get_latest_rates(base, true, skip_cache).await?;
    print_response("Latest rates", &response, client.currencies());
    Ok(())
}

pub async fn run_historical(client: &mut RateClient, date: &str, skip_cache: bool) -> Result<()> {
    let response = client.get_historical(date, skip_cache).await?;
    print_response(&format!("Rates on {date}"), &response, client.currencies());
    Ok(())
}

pub async fn run_currencies(client: &mut RateClient) -> Result<()> {
    match client.get_all_currencies(false).await? {
        ApiResponse::Data(catalog) => {
            info!(count = catalog.len(), "Listing currencies");
            let mut grid = ui::new_styled_table();
            grid.set_header(vec![ui::header_cell("Currency"), ui::header_cell("Name")]);
            for (code, name) in &catalog {
                grid.add_row(vec![Cell::new(code), Cell::new(name)]);
            }
            println!("{grid}");
        }
        ApiResponse::Error(err) => println!("{}", render_error(&err)),
    }
    Ok(())
}
