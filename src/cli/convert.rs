use super::ui;
use crate::core::{Conversion, ConversionResult};
use crate::rates::{ConvertOptions, RateClient};
use anyhow::Result;

pub fn render_conversion(result: &ConversionResult) -> String {
    format!(
        "{} {} = {} {}\n{}",
        result.amount,
        result.from,
        ui::style_text(&result.result, ui::StyleType::Value),
        ui::style_text(result.to.as_str(), ui::StyleType::Label),
        ui::style_text(
            &format!(
                "{} rate {} / {} rate {}",
                result.from, result.from_rate, result.to, result.to_rate
            ),
            ui::StyleType::Subtle
        ),
    )
}

pub async fn run(
    client: &mut RateClient,
    amount: f64,
    from: &str,
    to: &str,
    decimals: Option<usize>,
) -> Result<()> {
    let options = ConvertOptions {
        decimals,
        ..ConvertOptions::default()
    };
    match client.convert(from, to, amount, options).await? {
        Conversion::Raw(value) => println!("{value}"),
        Conversion::Detailed(result) => println!("{}", render_conversion(&result)),
    }
    Ok(())
}
