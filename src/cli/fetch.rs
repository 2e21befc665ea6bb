use crate::cli::ui;
use crate::core::config::AppConfig;
use crate::core::currency::pair_universe;
use anyhow::Result;

/// Fetches the whole pair universe and saves it to the configured output.
pub async fn run(config: &AppConfig) -> Result<()> {
    let total = pair_universe(&config.currencies()).len();
    let pb = ui::new_progress_bar(total as u64, true);
    pb.set_message("Fetching rates...");

    let result = crate::get_all_rates(config, pb.clone()).await;
    pb.finish_and_clear();

    match result {
        Ok(rates) => {
            println!("Currency rates fetched and saved successfully");
            println!(
                "{} {}/{} pairs -> {}",
                ui::style_text("Fetched:", ui::StyleType::TotalLabel),
                ui::style_text(&rates.len().to_string(), ui::StyleType::TotalValue),
                total,
                ui::style_text(&config.output.display().to_string(), ui::StyleType::Subtle)
            );
            Ok(())
        }
        Err(e) => {
            eprintln!(
                "{}",
                ui::style_text("Failed to fetch currency rates", ui::StyleType::Error)
            );
            Err(e)
        }
    }
}
