//! Stock metrics summary from `key=value` pairs

use crate::{Capability, Result, Tool, ToolError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Summarizes price, volume, market cap and P/E from supplied figures
///
/// Input looks like `price=100,volume=1000000,market_cap=5000000000`.
/// Items without `=` are ignored; every value must be a number.
#[derive(Debug, Default, Clone, Copy)]
pub struct StockMetrics;

impl StockMetrics {
    pub const NAME: &'static str = "Stock Price Analysis";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for StockMetrics {
    fn capability(&self) -> Capability {
        Capability::StockMetrics
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Analyze basic stock metrics and ratios. Input format: \
         \"price=100,volume=1000000,market_cap=5000000000,earnings_per_share=5\"."
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let data = parse_pairs(input)?;
        Ok(summarize(&data))
    }
}

fn parse_pairs(input: &str) -> Result<HashMap<String, f64>> {
    let mut data = HashMap::new();

    for item in input.split(',') {
        let Some((key, value)) = item.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        let number = value.parse::<f64>().map_err(|_| {
            ToolError::InvalidInput(format!("value for '{key}' is not a number: '{value}'"))
        })?;
        data.insert(key.to_string(), number);
    }

    Ok(data)
}

fn summarize(data: &HashMap<String, f64>) -> String {
    let mut analysis = String::from("Stock Metrics Analysis:\n");

    if let Some(price) = data.get("price") {
        let _ = writeln!(analysis, "- Current Price: ${price:.2}");
    }
    if let Some(volume) = data.get("volume") {
        let _ = writeln!(analysis, "- Trading Volume: {}", group_thousands(*volume));
    }
    if let Some(market_cap) = data.get("market_cap") {
        let _ = writeln!(analysis, "- Market Cap: ${}", group_thousands(*market_cap));
    }
    if let (Some(price), Some(eps)) = (data.get("price"), data.get("earnings_per_share"))
        && *eps > 0.0
    {
        let _ = writeln!(analysis, "- P/E Ratio: {:.2}", price / eps);
    }

    analysis
}

/// Round to a whole number and insert thousands separators
fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3 + 1);

    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if value < 0.0 && grouped != "0" {
        grouped.insert(0, '-');
    }
    grouped
}
