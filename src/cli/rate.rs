use crate::cli::ui;
use crate::core::config::AppConfig;
use crate::core::currency::CurrencyCode;
use anyhow::{Result, bail};

pub fn format_rate(base: CurrencyCode, quote: CurrencyCode, rate: f64) -> String {
    format!("1 {base} = {rate} {quote}")
}

/// Prints the latest rate for one pair. Fails when no rate is available.
pub async fn run(config: &AppConfig, base: CurrencyCode, quote: CurrencyCode) -> Result<()> {
    match crate::get_rate(config, base, quote).await? {
        Some(rate) => {
            println!(
                "{}",
                ui::style_text(&format_rate(base, quote, rate), ui::StyleType::TotalValue)
            );
            Ok(())
        }
        None => {
            eprintln!(
                "{}",
                ui::style_text(
                    &format!("No rate available for {base} / {quote}"),
                    ui::StyleType::Error
                )
            );
            bail!("No rate available for {base} / {quote}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rate() {
        assert_eq!(
            format_rate(CurrencyCode::EUR, CurrencyCode::USD, 1.0576),
            "1 EUR = 1.0576 USD"
        );
    }
}
