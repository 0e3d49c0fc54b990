use derive_more::Display;
use rust_decimal::Decimal as WrappedDecimal;
use std::str::FromStr;
use thiserror::Error as ThisError;

///
/// DecimalParseError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
#[error("invalid decimal literal '{literal}': {reason}")]
pub struct DecimalParseError {
    pub literal: String,
    pub reason: String,
}

///
/// DecimalParts
///
/// Canonical decomposition of a Decimal.
///
/// Invariant:
/// - value == mantissa * 10^-scale
/// - mantissa carries the sign
/// - mantissa has no trailing decimal zeros unless scale is 0
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecimalParts {
    pub mantissa: i128,
    pub scale: u32,
}

///
/// Decimal
///
/// High-precision decimal scalar. The representable budget is 28
/// significant digits; literals beyond that budget are rounded on parse, so
/// two visually different literals may compare equal. That widening is
/// observable and intentional.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Decimal(WrappedDecimal);

impl Decimal {
    pub const ZERO: Self = Self(WrappedDecimal::ZERO);

    /// Maximum number of fractional digits a Decimal can carry.
    pub const MAX_SCALE: u32 = 28;

    /// Parse a plain (`"-12.50"`) or scientific (`"1.25e-3"`) literal.
    ///
    /// Digits beyond the representable budget are rounded rather than
    /// rejected.
    pub fn parse(literal: &str) -> Result<Self, DecimalParseError> {
        let trimmed = literal.trim();
        let parsed = if trimmed.contains(['e', 'E']) {
            WrappedDecimal::from_scientific(trimmed)
        } else {
            WrappedDecimal::from_str(trimmed)
        };

        parsed.map(Self).map_err(|err| DecimalParseError {
            literal: literal.to_string(),
            reason: err.to_string(),
        })
    }

    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Self(WrappedDecimal::from(value))
    }

    /// Rebuild a decimal from its mantissa and scale, if representable.
    #[must_use]
    pub fn from_parts(mantissa: i128, scale: u32) -> Option<Self> {
        if scale > Self::MAX_SCALE {
            return None;
        }

        WrappedDecimal::try_from_i128_with_scale(mantissa, scale)
            .ok()
            .map(Self)
    }

    /// Canonical parts with trailing zeros stripped.
    #[must_use]
    pub fn parts(&self) -> DecimalParts {
        let normalized = self.0.normalize();

        DecimalParts {
            mantissa: normalized.mantissa(),
            scale: normalized.scale(),
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub fn is_sign_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl FromStr for Decimal {
    type Err = DecimalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_strip_trailing_zeros() {
        let value = Decimal::parse("12.5000").expect("decimal should parse");

        assert_eq!(
            value.parts(),
            DecimalParts {
                mantissa: 125,
                scale: 1
            }
        );
    }

    #[test]
    fn negative_zero_is_not_sign_negative() {
        let value = Decimal::parse("-0.00").expect("decimal should parse");

        assert!(value.is_zero());
        assert!(!value.is_sign_negative());
    }

    #[test]
    fn scientific_literals_parse() {
        let value = Decimal::parse("1.25e-3").expect("decimal should parse");

        assert_eq!(value, Decimal::parse("0.00125").expect("decimal should parse"));
    }

    #[test]
    fn literals_beyond_budget_round() {
        let long = Decimal::parse("1.00000000000000000000000000001").expect("decimal should parse");

        assert_eq!(long, Decimal::from_i64(1));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Decimal::parse("1.2.3").is_err());
    }

    #[test]
    fn from_parts_round_trips() {
        let value = Decimal::parse("-3.75").expect("decimal should parse");
        let parts = value.parts();

        assert_eq!(Decimal::from_parts(parts.mantissa, parts.scale), Some(value));
        assert_eq!(Decimal::from_parts(1, 29), None);
    }
}
