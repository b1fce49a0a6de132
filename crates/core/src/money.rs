//! Money helpers. Amounts are `i64` in the smallest currency unit (cents).
//!
//! On the wire amounts are decimal numbers with at most two places
//! (`10.5` is 1050 cents); see [`decimal_amount`].

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{DomainError, DomainResult};

/// Decimal places carried by an amount.
pub const AMOUNT_SCALE: u32 = 2;

/// `price × quantity`, rejecting overflow.
pub fn line_subtotal(price: i64, quantity: i64) -> DomainResult<i64> {
    price
        .checked_mul(quantity)
        .ok_or_else(|| DomainError::validation("line subtotal overflows"))
}

/// Sum of amounts, rejecting overflow.
pub fn checked_sum<I>(amounts: I) -> DomainResult<i64>
where
    I: IntoIterator<Item = i64>,
{
    amounts.into_iter().try_fold(0i64, |acc, amount| {
        acc.checked_add(amount)
            .ok_or_else(|| DomainError::validation("amount total overflows"))
    })
}

/// Convert a decimal amount into cents. More than two decimal places is a
/// validation error, not a rounding.
pub fn cents_from_decimal(amount: Decimal) -> DomainResult<i64> {
    let amount = amount.normalize();
    if amount.scale() > AMOUNT_SCALE {
        return Err(DomainError::validation(format!(
            "Amount {amount} has more than {AMOUNT_SCALE} decimal places"
        )));
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| DomainError::validation(format!("Amount {amount} is out of range")))
}

pub fn decimal_from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, AMOUNT_SCALE)
}

/// Serde adapter for `i64` cent fields: emitted as a JSON number with two
/// implied decimals, read back from a number or numeric string.
pub mod decimal_amount {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserialize, Deserializer, Serializer, de, ser};

    pub fn serialize<S>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = super::decimal_from_cents(*cents)
            .to_f64()
            .ok_or_else(|| <S::Error as ser::Error>::custom("amount is not representable"))?;
        serializer.serialize_f64(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        super::cents_from_decimal(amount).map_err(<D::Error as de::Error>::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn subtotal_multiplies() {
        assert_eq!(line_subtotal(1000, 2).unwrap(), 2000);
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(line_subtotal(i64::MAX, 2).is_err());
        assert!(checked_sum([i64::MAX, 1]).is_err());
    }

    #[test]
    fn empty_sum_is_zero() {
        assert_eq!(checked_sum(Vec::new()).unwrap(), 0);
    }

    #[test]
    fn decimals_convert_to_cents() {
        let cents = |s: &str| cents_from_decimal(Decimal::from_str(s).unwrap());
        assert_eq!(cents("10").unwrap(), 1000);
        assert_eq!(cents("10.5").unwrap(), 1050);
        assert_eq!(cents("0.99").unwrap(), 99);
        assert_eq!(cents("5.000").unwrap(), 500);
    }

    #[test]
    fn third_decimal_place_is_rejected() {
        let err = cents_from_decimal(Decimal::from_str("1.005").unwrap()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[derive(Debug, serde::Serialize, serde::Deserialize)]
    struct Priced {
        #[serde(with = "decimal_amount")]
        price: i64,
    }

    #[test]
    fn wire_amounts_are_decimal_numbers() {
        let json = serde_json::to_value(Priced { price: 2500 }).unwrap();
        assert_eq!(json["price"], 25.0);

        let read: Priced = serde_json::from_str(r#"{"price": 10.0}"#).unwrap();
        assert_eq!(read.price, 1000);
        let read: Priced = serde_json::from_str(r#"{"price": 7}"#).unwrap();
        assert_eq!(read.price, 700);
        assert!(serde_json::from_str::<Priced>(r#"{"price": 0.125}"#).is_err());
    }
}
