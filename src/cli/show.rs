use crate::cli::ui;
use crate::core::currency::{CurrencyCode, RateMap};
use crate::store;
use anyhow::Result;
use std::path::Path;

/// Renders a rate map as a two column table.
pub fn display_rates_table(rates: &RateMap) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Pair"), ui::header_cell("Rate")]);

    for (pair, rate) in rates.iter() {
        table.add_row(vec![comfy_table::Cell::new(pair), ui::rate_cell(rate)]);
    }

    table.to_string()
}

pub fn run(path: &Path) -> Result<()> {
    let rates = store::read_rates(path)?;

    println!(
        "Rates: {}\n",
        ui::style_text(&path.display().to_string(), ui::StyleType::Title)
    );
    println!("{}", display_rates_table(&rates));
    println!(
        "\n{} {}",
        ui::style_text("Pairs:", ui::StyleType::TotalLabel),
        ui::style_text(&rates.len().to_string(), ui::StyleType::TotalValue)
    );
    Ok(())
}

fn codes_line(codes: &[CurrencyCode]) -> String {
    let codes: Vec<&str> = codes.iter().map(CurrencyCode::as_str).collect();
    codes.join(" ")
}

/// Prints every recognized currency code, regardless of the configured subset.
pub fn print_codes() {
    println!("{}", codes_line(CurrencyCode::ALL));
}
