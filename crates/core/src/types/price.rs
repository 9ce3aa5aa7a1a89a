//! Type-safe price representation in integer minor units.
//!
//! Catalog prices come from the original Steam dataset, which stores prices
//! in cents. Keeping prices integral avoids floating-point rounding in
//! checkout totals.

use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// A monetary amount in minor units (cents for USD).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(0);

    /// Create a price from minor units (e.g. cents).
    #[must_use]
    pub const fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    /// Get the amount in minor units.
    #[must_use]
    pub const fn as_minor_units(&self) -> i64 {
        self.0
    }

    /// Format for display in major units (e.g. "$12.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("${}.{:02}", self.0 / 100, (self.0 % 100).abs())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let units = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(units))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_minor_units() {
        let total: Price = [Price::from_minor_units(1000), Price::from_minor_units(2500)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_minor_units(3500));
    }

    #[test]
    fn displays_major_units() {
        assert_eq!(Price::from_minor_units(1299).display(), "$12.99");
        assert_eq!(Price::from_minor_units(500).display(), "$5.00");
        assert_eq!(Price::ZERO.display(), "$0.00");
    }
}
