#![forbid(unsafe_code)]

use super::super::StoreError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Prices are non-negative with at most two fractional digits.
pub(in crate::store) fn validate_price(
    value: Decimal,
    field: &'static str,
) -> Result<Decimal, StoreError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(StoreError::InvalidArgument(field));
    }
    if value.normalize().scale() > 2 {
        return Err(StoreError::InvalidArgument(field));
    }
    Ok(value.round_dp(2))
}

pub(in crate::store) fn format_price(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

pub(in crate::store) fn parse_price(raw: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(raw.trim())
        .map_err(|_| StoreError::InvalidArgument("stored price is not a decimal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_validation_and_format() {
        assert_eq!(format_price(Decimal::new(999, 2)), "9.99");
        assert_eq!(format_price(Decimal::new(5, 0)), "5.00");
        assert_eq!(format_price(Decimal::new(12500, 3)), "12.50");

        assert!(validate_price(Decimal::new(-1, 2), "unit price").is_err());
        assert!(validate_price(Decimal::new(1001, 3), "unit price").is_err());
        assert_eq!(
            validate_price(Decimal::new(12500, 3), "unit price").unwrap(),
            Decimal::new(1250, 2)
        );
        assert_eq!(parse_price(" 9.99 ").unwrap(), Decimal::new(999, 2));
    }
}
