use super::ui;
use crate::core::{CurrencyCode, TimeSeries};
use crate::rates::RateClient;
use anyhow::Result;
use comfy_table::Cell;
use std::collections::BTreeSet;

// Beyond this many currencies a wide table stops being readable.
const MAX_WIDE_COLUMNS: usize = 8;

pub fn render_series(series: &TimeSeries) -> String {
    if series.is_empty() {
        return ui::style_text("No data received for the requested range", ui::StyleType::Error);
    }

    let currencies: BTreeSet<&CurrencyCode> =
        series.days.values().flat_map(|rates| rates.keys()).collect();

    let mut grid = ui::new_styled_table();
    if currencies.len() <= MAX_WIDE_COLUMNS {
        let mut header = vec![ui::header_cell("Date")];
        header.extend(currencies.iter().map(|c| ui::header_cell(c.as_str())));
        grid.set_header(header);

        for (day, rates) in &series.days {
            let mut row = vec![Cell::new(day)];
            row.extend(
                currencies
                    .iter()
                    .map(|c| rates.get(*c).map_or_else(ui::na_cell, |r| ui::rate_cell(*r))),
            );
            grid.add_row(row);
        }
    } else {
        grid.set_header(vec![
            ui::header_cell("Date"),
            ui::header_cell("Currency"),
            ui::header_cell("Rate"),
        ]);
        for (day, rates) in &series.days {
            for (code, rate) in rates {
                grid.add_row(vec![Cell::new(day), Cell::new(code), ui::rate_cell(*rate)]);
            }
        }
    }

    let mut output = format!(
        "{} {}\n\n{}",
        ui::style_text("Time series", ui::StyleType::Title),
        ui::style_text(&format!("base {}", series.base), ui::StyleType::Label),
        grid
    );
    let attribution = ui::attribution(&series.disclaimer, &series.license);
    if !attribution.is_empty() {
        output.push_str("\n\n");
        output.push_str(&attribution);
    }
    output
}

pub async fn run(client: &RateClient, start: &str, end: &str, skip_cache: bool) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching daily rates {start} to {end}..."));
    let result = client.get_time_series(start, end, skip_cache).await;
    pb.finish_and_clear();

    println!("{}", render_series(&result?));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    #[test]
    fn test_render_wide_series_marks_missing_rates() {
        let mut series = TimeSeries::new(code("EUR"));
        series.days.insert(
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            [(code("USD"), 1.2), (code("GBP"), 0.9)].into_iter().collect(),
        );
        series.days.insert(
            NaiveDate::from_ymd_opt(2021, 1, 3).unwrap(),
            [(code("USD"), 1.21)].into_iter().collect(),
        );

        let output = render_series(&series);
        assert!(output.contains("2021-01-01"));
        assert!(output.contains("2021-01-03"));
        assert!(!output.contains("2021-01-02"));
        assert!(output.contains("1.210000"));
        assert!(output.contains("N/A"));
    }

    #[test]
    fn test_render_empty_series() {
        let series = TimeSeries::new(code("EUR"));
        assert!(render_series(&series).contains("No data received"));
    }
}
