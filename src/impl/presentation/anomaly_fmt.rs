use iso_currency::Currency;

use super::utils::{format_amount, format_number, format_percentage};

pub(crate) fn overrun_title(budget_name: &str) -> String {
    format!("Budget Overrun Alert - {}", budget_name)
}

pub(crate) fn overrun_description(spent_ratio: f64) -> String {
    format!(
        "Budget has reached {} of total allocation.",
        format_percentage(spent_ratio)
    )
}

pub(crate) fn unusual_spending_title(amount: f64, currency: Currency) -> String {
    format!("Unusual Spending Detected - {}", format_number(amount, currency))
}

pub(crate) fn unusual_spending_description(amount: f64, average: f64, currency: Currency) -> String {
    format!(
        "Recent transaction amount ({}) is {:.1}x the average spending.",
        format_amount(amount, currency),
        amount / average
    )
}

pub(crate) fn duplicate_title() -> String {
    "Potential Duplicate Transaction Detected".to_string()
}

pub(crate) fn duplicate_description(similarity: f64, first: &str, second: &str) -> String {
    format!(
        "Two transactions are {} similar: \"{}\" and \"{}\"",
        format_percentage(similarity),
        first,
        second
    )
}
