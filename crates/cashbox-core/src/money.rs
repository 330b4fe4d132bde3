//! Currency formatting for display.

use serde::{Deserialize, Serialize};

/// Turns an amount into a display string.
pub trait CurrencyFormatter: Send + Sync {
    fn format(&self, amount: f64) -> String;

    /// Lowercase ISO currency code the amounts are expressed in.
    fn currency(&self) -> &str {
        "usd"
    }
}

impl<F> CurrencyFormatter for F
where
    F: Fn(f64) -> String + Send + Sync,
{
    fn format(&self, amount: f64) -> String {
        self(amount)
    }
}

/// Symbol-prefixed formatting with two decimals and `,` grouping.
///
/// `1234.5` renders as `$1,234.50`, `-3` as `-$3.00`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub currency: String,
    pub symbol: String,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::new("usd", "$")
    }
}

impl CurrencyFormat {
    pub fn new(currency: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            currency: currency.into().to_lowercase(),
            symbol: symbol.into(),
        }
    }

    /// Pick the conventional symbol for a handful of common currencies.
    pub fn for_currency(currency: &str) -> Self {
        let symbol = match currency.to_lowercase().as_str() {
            "usd" | "aud" | "cad" | "nzd" => "$",
            "eur" => "€",
            "gbp" => "£",
            "jpy" => "¥",
            "huf" => "Ft ",
            "chf" => "CHF ",
            other => return Self::new(other, format!("{} ", other.to_uppercase())),
        };
        Self::new(currency, symbol)
    }
}

impl CurrencyFormatter for CurrencyFormat {
    fn format(&self, amount: f64) -> String {
        let formatted = number_format(amount.abs());
        if amount < 0.0 && formatted != "0.00" {
            format!("-{}{}", self.symbol, formatted)
        } else {
            format!("{}{}", self.symbol, formatted)
        }
    }

    fn currency(&self) -> &str {
        &self.currency
    }
}

fn number_format(amount: f64) -> String {
    let fixed = format!("{:.2}", amount);
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}.{}", grouped, cents)
}
