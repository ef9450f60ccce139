use iso_currency::Currency;
use num_format::{Locale, ToFormattedString as _};

/// Standard number decimal places for the given currency
/// (ex. JPY = 0, INR = 2).
fn decimal_places(currency: Currency) -> u32 {
    currency.exponent().unwrap_or(0) as u32
}

/// Format amount with thousands separators and the currency's number of
/// decimal places, without a currency mark (ex. 1,234,567.50).
///
/// For consistency, uses en locale ('.' as decimal mark) regardless of the
/// currency.
pub(crate) fn format_number(amount: f64, currency: Currency) -> String {
    let places = decimal_places(currency);
    let factor = 10_i64.pow(places);
    let scaled = (amount.abs() * factor as f64).round() as i64;
    let sign = if amount < 0.0 && scaled != 0 { "-" } else { "" };
    let integer_part = (scaled / factor).to_formatted_string(&Locale::en);
    if places == 0 {
        format!("{}{}", sign, integer_part)
    } else {
        format!(
            "{}{}.{:0width$}",
            sign,
            integer_part,
            scaled % factor,
            width = places as usize
        )
    }
}

/// Format amount followed by the currency symbol (ex. 1,000.00 ₹).
pub(crate) fn format_amount(amount: f64, currency: Currency) -> String {
    format!("{} {}", format_number(amount, currency), currency.symbol())
}

/// Ratio as a percentage with one decimal (ex. 0.853 -> "85.3%").
pub(crate) fn format_percentage(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
