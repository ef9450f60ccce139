use std::str::FromStr;

use fractic_server_error::ServerError;

use crate::errors::InvalidAmount;

/// Amount as written in spreadsheets: thousands separators allowed, negative
/// values in accounting notation `(1,000.00)`, optional currency sign.
#[derive(Debug)]
pub(crate) struct AmountModel(pub f64);

impl FromStr for AmountModel {
    type Err = ServerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().replace(',', "");
        let is_negative = raw.starts_with('(') && raw.ends_with(')');
        let numeric_part = raw
            .trim_matches(|c| c == '(' || c == ')')
            .trim_start_matches(|c| matches!(c, '₹' | '$' | '€'))
            .trim();
        let amount = numeric_part
            .parse::<f64>()
            .map_err(|_| InvalidAmount::new(s))?;
        if !amount.is_finite() {
            return Err(InvalidAmount::new(s));
        }
        Ok(AmountModel(if is_negative { -amount } else { amount }))
    }
}

impl From<AmountModel> for f64 {
    fn from(model: AmountModel) -> f64 {
        model.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amounts() {
        assert_eq!(AmountModel::from_str("1,250.50").unwrap().0, 1250.5);
        assert_eq!(AmountModel::from_str("(300)").unwrap().0, -300.0);
        assert_eq!(AmountModel::from_str(" ₹4,000 ").unwrap().0, 4000.0);
        assert!(AmountModel::from_str("twelve").is_err());
        assert!(AmountModel::from_str("inf").is_err());
    }
}
