//! Exact numeric decomposition shared by value comparison and the index
//! codec.
//!
//! Every number folds onto one domain: `±0.d1d2…dn × 10^exponent` with no
//! leading or trailing zero digits. Doubles are expanded to their exact
//! decimal value and truncated to `MAX_NUMBER_DIGITS`.

use crate::{
    MAX_NUMBER_DIGITS,
    types::Decimal,
    value::{Value, compare::compare_f64},
};
use num_bigint::BigUint;
use std::cmp::Ordering;

/// Largest power of ten below which every integer converts to i64 exactly.
const MAX_I64_DIGITS: i32 = 19;

///
/// Magnitude
///
/// Normalized significand digits (each `0..=9`) and decimal exponent.
/// Field order gives the magnitude order directly.
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub(crate) struct Magnitude {
    pub(crate) exponent: i32,
    pub(crate) digits: Vec<u8>,
}

impl Magnitude {
    /// Build from raw digits and the position of the decimal point
    /// (`exponent` digits sit before it), normalizing both ends.
    pub(crate) fn normalized(mut digits: Vec<u8>, mut exponent: i32) -> Option<Self> {
        let leading = digits.iter().take_while(|d| **d == 0).count();
        digits.drain(..leading);
        exponent = exponent.saturating_sub(i32::try_from(leading).unwrap_or(i32::MAX));

        digits.truncate(MAX_NUMBER_DIGITS);
        while digits.last() == Some(&0) {
            digits.pop();
        }

        if digits.is_empty() {
            None
        } else {
            Some(Self { exponent, digits })
        }
    }

    fn from_decimal_string(text: &str, exponent: i32) -> Option<Self> {
        let digits = text.bytes().map(|b| b - b'0').collect();

        Self::normalized(digits, exponent)
    }

    fn digit_string(&self) -> String {
        self.digits.iter().map(|d| char::from(b'0' + d)).collect()
    }
}

///
/// NumberParts
///
/// Sign-aware numeric category plus magnitude. Ordered NaN first, then
/// from negative infinity to positive infinity.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum NumberParts {
    NaN,
    NegativeInfinity,
    Negative(Magnitude),
    Zero,
    Positive(Magnitude),
    PositiveInfinity,
}

impl NumberParts {
    const fn rank(&self) -> u8 {
        match self {
            Self::NaN => 0,
            Self::NegativeInfinity => 1,
            Self::Negative(_) => 2,
            Self::Zero => 3,
            Self::Positive(_) => 4,
            Self::PositiveInfinity => 5,
        }
    }

    /// Decompose a numeric value; non-numbers yield `None`.
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(v) => Some(Self::from_i64(*v)),
            Value::Int32(v) => Some(Self::from_i64(i64::from(*v))),
            Value::Double(v) => Some(Self::from_f64(*v)),
            Value::Decimal(v) => Some(Self::from_decimal(v)),
            _ => None,
        }
    }

    pub(crate) fn from_i64(value: i64) -> Self {
        let magnitude = value.unsigned_abs().to_string();
        let exponent = i32::try_from(magnitude.len()).unwrap_or(i32::MAX);

        Self::signed(value < 0, Magnitude::from_decimal_string(&magnitude, exponent))
    }

    pub(crate) fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::NaN;
        }
        if value.is_infinite() {
            return if value > 0.0 {
                Self::PositiveInfinity
            } else {
                Self::NegativeInfinity
            };
        }
        if value == 0.0 {
            return Self::Zero;
        }

        let bits = value.to_bits();
        let biased = i32::try_from((bits >> 52) & 0x7ff).unwrap_or(0);
        let fraction = bits & ((1u64 << 52) - 1);
        let (mantissa, power_of_two) = if biased == 0 {
            (fraction, -1074)
        } else {
            (fraction | (1u64 << 52), biased - 1075)
        };

        // mantissa * 2^p == (mantissa * 5^-p) / 10^-p for negative p.
        let magnitude = if power_of_two >= 0 {
            let scaled = BigUint::from(mantissa) << power_of_two.unsigned_abs();
            let text = scaled.to_string();
            let exponent = i32::try_from(text.len()).unwrap_or(i32::MAX);
            Magnitude::from_decimal_string(&text, exponent)
        } else {
            let shift = power_of_two.unsigned_abs();
            let scaled = BigUint::from(mantissa) * BigUint::from(5u32).pow(shift);
            let text = scaled.to_string();
            let exponent = i32::try_from(text.len()).unwrap_or(i32::MAX)
                - i32::try_from(shift).unwrap_or(i32::MAX);
            Magnitude::from_decimal_string(&text, exponent)
        };

        Self::signed(value < 0.0, magnitude)
    }

    pub(crate) fn from_decimal(value: &Decimal) -> Self {
        let parts = value.parts();
        let text = parts.mantissa.unsigned_abs().to_string();
        let exponent = i32::try_from(text.len()).unwrap_or(i32::MAX)
            - i32::try_from(parts.scale).unwrap_or(i32::MAX);

        Self::signed(
            parts.mantissa < 0,
            Magnitude::from_decimal_string(&text, exponent),
        )
    }

    fn signed(negative: bool, magnitude: Option<Magnitude>) -> Self {
        match magnitude {
            None => Self::Zero,
            Some(m) if negative => Self::Negative(m),
            Some(m) => Self::Positive(m),
        }
    }

    /// Rebuild the narrowest value kind that is canonically equal to these
    /// parts: an i64 when integral and in range, else a double when the
    /// parts are exactly a double's expansion, else a decimal.
    pub(crate) fn to_value(&self) -> Value {
        let (negative, magnitude) = match self {
            Self::NaN => return Value::Double(f64::NAN),
            Self::NegativeInfinity => return Value::Double(f64::NEG_INFINITY),
            Self::PositiveInfinity => return Value::Double(f64::INFINITY),
            Self::Zero => return Value::Integer(0),
            Self::Negative(m) => (true, m),
            Self::Positive(m) => (false, m),
        };

        if let Some(integer) = integral_i64(negative, magnitude) {
            return Value::Integer(integer);
        }

        let sign = if negative { "-" } else { "" };
        let literal = format!(
            "{sign}0.{}e{}",
            magnitude.digit_string(),
            magnitude.exponent
        );
        let double = literal.parse::<f64>().ok().filter(|d| d.is_finite());
        if let Some(double) = double
            && Self::from_f64(double) == *self
        {
            return Value::Double(double);
        }

        if let Some(decimal) = to_decimal(negative, magnitude) {
            return Value::Decimal(decimal);
        }

        // Outside every exact representation; nearest double.
        Value::Double(double.unwrap_or(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }))
    }
}

impl Ord for NumberParts {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Negative(a), Self::Negative(b)) => b.cmp(a),
            (Self::Positive(a), Self::Positive(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for NumberParts {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn integral_i64(negative: bool, magnitude: &Magnitude) -> Option<i64> {
    let digit_count = i32::try_from(magnitude.digits.len()).ok()?;
    if magnitude.exponent < digit_count || magnitude.exponent > MAX_I64_DIGITS {
        return None;
    }

    let mut value: i128 = 0;
    for digit in &magnitude.digits {
        value = value * 10 + i128::from(*digit);
    }
    for _ in digit_count..magnitude.exponent {
        value *= 10;
    }
    if negative {
        value = -value;
    }

    i64::try_from(value).ok()
}

fn to_decimal(negative: bool, magnitude: &Magnitude) -> Option<Decimal> {
    let digit_count = i32::try_from(magnitude.digits.len()).ok()?;
    let scale = digit_count - magnitude.exponent;

    let mut mantissa: i128 = 0;
    for digit in &magnitude.digits {
        mantissa = mantissa.checked_mul(10)?.checked_add(i128::from(*digit))?;
    }
    // Integral values with a negative scale need trailing zeros restored.
    let scale = if scale < 0 {
        for _ in 0..(-scale) {
            mantissa = mantissa.checked_mul(10)?;
        }
        0
    } else {
        scale
    };
    if negative {
        mantissa = -mantissa;
    }

    Decimal::from_parts(mantissa, u32::try_from(scale).ok()?)
}

/// Compare two numeric values by mathematical value.
///
/// Integer and double pairs take exact fast paths; anything involving a
/// decimal goes through [`NumberParts`].
pub(crate) fn compare_numbers(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Double(a), Value::Double(b)) => compare_f64(*a, *b),
        (Value::Double(d), other) | (other, Value::Double(d)) if integer_of(other).is_some() => {
            let integer = integer_of(other).unwrap_or_default();
            let cmp = compare_i64_f64(integer, *d);
            if matches!(left, Value::Double(_)) {
                cmp.reverse()
            } else {
                cmp
            }
        }
        _ => match (integer_of(left), integer_of(right)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => NumberParts::from_value(left).cmp(&NumberParts::from_value(right)),
        },
    }
}

const fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(v) => Some(*v),
        Value::Int32(v) => Some(*v as i64),
        _ => None,
    }
}

/// Exact comparison of an integer with a double.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn compare_i64_f64(integer: i64, double: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

    if double.is_nan() {
        return Ordering::Greater;
    }
    if double >= TWO_POW_63 {
        return Ordering::Less;
    }
    if double < -TWO_POW_63 {
        return Ordering::Greater;
    }

    let truncated = double.trunc();
    match integer.cmp(&(truncated as i64)) {
        Ordering::Equal => {
            let fraction = double - truncated;
            if fraction > 0.0 {
                Ordering::Less
            } else if fraction < 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        other => other,
    }
}
