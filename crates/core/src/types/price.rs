//! Item prices in Indonesian rupiah.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A non-negative rupiah amount.
///
/// Stored as `NUMERIC(12, 2)`; displayed without decimals using `.` as the
/// thousands separator (`Rp 12.500`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Apply a percentage discount. The percentage is clamped to 0-100.
    #[must_use]
    pub fn discounted(&self, percent: i32) -> Self {
        let percent = Decimal::from(percent.clamp(0, 100));
        let remaining = Decimal::ONE_HUNDRED - percent;
        Self((self.0 * remaining / Decimal::ONE_HUNDRED).round_dp(2))
    }

    /// Format for display, rounded to whole rupiah.
    #[must_use]
    pub fn display(&self) -> String {
        let whole = self.0.round().to_i64().unwrap_or_default();
        let digits = whole.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        if whole < 0 {
            format!("-Rp {grouped}")
        } else {
            format!("Rp {grouped}")
        }
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn price(s: &str) -> Price {
        Price::new(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(price("0").display(), "Rp 0");
        assert_eq!(price("950").display(), "Rp 950");
        assert_eq!(price("12500").display(), "Rp 12.500");
        assert_eq!(price("1250000.40").display(), "Rp 1.250.000");
        assert_eq!(price("999.60").display(), "Rp 1.000");
    }

    #[test]
    fn test_discount() {
        assert_eq!(price("20000").discounted(25), price("15000"));
        assert_eq!(price("20000").discounted(0), price("20000"));
        assert_eq!(price("20000").discounted(150), price("0"));
        assert_eq!(price("20000").discounted(-5), price("20000"));
    }

    #[test]
    fn test_serializes_as_string() {
        assert_eq!(serde_json::to_string(&price("1500.50")).unwrap(), "\"1500.50\"");
    }
}
