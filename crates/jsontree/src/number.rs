use core::fmt;

/// Smallest magnitude printed without an exponent.
const PLAIN_MIN: f64 = 1e-5;
/// Smallest magnitude printed with an exponent.
const PLAIN_MAX: f64 = 1e16;

/// A JSON number: the floating value plus an integer shadow.
///
/// The shadow is present when the value is known to be an exact `i64`, either because the
/// literal it was parsed from was integral or because it was built from an integral float.
#[derive(Debug, Copy, Clone)]
pub struct Number {
    value: f64,
    integer: Option<i64>,
}

impl Number {
    /// Build a number from a float, deriving the integer shadow from its value.
    #[must_use]
    pub fn from_f64(value: f64) -> Number {
        Number {
            value,
            integer: integral(value),
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_i64(value: i64) -> Number {
        Number {
            value: value as f64,
            integer: Some(value),
        }
    }

    /// Build a number from a validated JSON number literal.
    pub(crate) fn from_literal(literal: &str, is_integral: bool) -> Option<Number> {
        let value = literal.parse::<f64>().ok()?;
        let integer = if is_integral {
            literal.parse::<i64>().ok()
        } else {
            None
        };
        Some(Number { value, integer })
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.value
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.integer
    }

    #[inline]
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.integer.is_some()
    }

    pub(crate) fn write<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        if let Some(integer) = self.integer {
            let mut buffer = itoa::Buffer::new();
            return out.write_str(buffer.format(integer));
        }
        let value = self.value;
        if !value.is_finite() {
            // JSON has no literal for NaN or the infinities
            return out.write_str("0");
        }
        let magnitude = value.abs();
        if magnitude != 0.0 && !(PLAIN_MIN..PLAIN_MAX).contains(&magnitude) {
            write!(out, "{value:e}")
        } else {
            write!(out, "{value}")
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral(value: f64) -> Option<i64> {
    // `i64::MAX as f64` rounds up to 2^63, which is out of range.
    if value.is_finite()
        && value.fract() == 0.0
        && value >= i64::MIN as f64
        && value < i64::MAX as f64
    {
        Some(value as i64)
    } else {
        None
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self.integer, other.integer) {
            (Some(a), Some(b)) => a == b,
            _ => self.value == other.value,
        }
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::from_i64(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Number::from_f64(1.0), "1")]
    #[test_case(Number::from_f64(-42.0), "-42")]
    #[test_case(Number::from_f64(0.5), "0.5")]
    #[test_case(Number::from_f64(3.14), "3.14")]
    #[test_case(Number::from_f64(1e300), "1e300")]
    #[test_case(Number::from_f64(1.5e-7), "1.5e-7")]
    #[test_case(Number::from_f64(1e20), "1e20")]
    #[test_case(Number::from_f64(f64::NAN), "0"; "nan")]
    #[test_case(Number::from_f64(f64::INFINITY), "0"; "infinity")]
    #[test_case(Number::from_f64(f64::NEG_INFINITY), "0"; "negative infinity")]
    #[test_case(Number::from_i64(i64::MIN), "-9223372036854775808")]
    fn test_display(number: Number, expected: &str) {
        assert_eq!(number.to_string(), expected);
    }

    #[test_case(0.0, Some(0))]
    #[test_case(7.0, Some(7))]
    #[test_case(7.25, None)]
    #[test_case(f64::NAN, None; "nan")]
    #[test_case(f64::INFINITY, None; "infinity")]
    #[test_case(9.3e18, None; "above i64 range")]
    fn test_integer_shadow(value: f64, expected: Option<i64>) {
        assert_eq!(Number::from_f64(value).as_i64(), expected);
    }

    #[test_case("12", true, Some(12))]
    #[test_case("-0", true, Some(0))]
    #[test_case("1.0", false, None)]
    #[test_case("1e2", false, None)]
    #[test_case("18446744073709551616", true, None; "too big for i64")]
    fn test_literal_shadow(literal: &str, is_integral: bool, expected: Option<i64>) {
        let number = Number::from_literal(literal, is_integral).expect("Valid literal");
        assert_eq!(number.as_i64(), expected);
    }

    #[test]
    fn test_big_literal_keeps_float_value() {
        let number = Number::from_literal("18446744073709551616", true).expect("Valid literal");
        assert_eq!(number.as_f64(), 18_446_744_073_709_551_616.0);
        assert_eq!(number.to_string(), "1.8446744073709552e19");
    }
}
