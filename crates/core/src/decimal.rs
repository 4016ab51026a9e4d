//! Arbitrary-precision decimals and currency codes

use crate::error::{CoreError, Result};
use std::fmt;
use std::str::FromStr;

/// Arbitrary-precision decimal: an unscaled integer and a scale
///
/// The value is `unscaled × 10^-scale`. Equality is scale-sensitive, so
/// `1.0` and `1.00` are different values; this matches how the value was
/// written and round-trips exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigDecimal {
    negative: bool,
    /// Decimal digits of the unscaled value, no leading zeros (`"0"` for zero)
    digits: String,
    scale: u32,
}

impl BigDecimal {
    /// Zero with scale 0
    pub fn zero() -> Self {
        BigDecimal {
            negative: false,
            digits: "0".to_string(),
            scale: 0,
        }
    }

    /// Build from an unscaled integer string (optionally signed) and a scale
    pub fn from_unscaled(unscaled: &str, scale: u32) -> Result<Self> {
        let (negative, digits) = match unscaled.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, unscaled.strip_prefix('+').unwrap_or(unscaled)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidDecimal(unscaled.to_string()));
        }
        let trimmed = digits.trim_start_matches('0');
        let digits = if trimmed.is_empty() { "0" } else { trimmed };
        Ok(BigDecimal {
            negative: negative && digits != "0",
            digits: digits.to_string(),
            scale,
        })
    }

    /// Signed unscaled integer as text
    pub fn unscaled(&self) -> String {
        if self.negative {
            format!("-{}", self.digits)
        } else {
            self.digits.clone()
        }
    }

    /// Number of digits after the decimal point
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// True for any zero regardless of scale
    pub fn is_zero(&self) -> bool {
        self.digits == "0"
    }

    /// True for values below zero
    pub fn is_negative(&self) -> bool {
        self.negative
    }
}

impl FromStr for BigDecimal {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidDecimal(s.to_string());
        let (int_part, frac_part) = match s.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (s, ""),
        };
        if s.ends_with('.') || frac_part.starts_with(&['-', '+'][..]) {
            return Err(invalid());
        }
        let unsigned_int = int_part.trim_start_matches(&['-', '+'][..]);
        if unsigned_int.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        // ".5" and "-.5" carry no integer digits
        let unscaled = if unsigned_int.is_empty() {
            format!("{}0{}", int_part, frac_part)
        } else {
            format!("{}{}", int_part, frac_part)
        };
        BigDecimal::from_unscaled(&unscaled, scale).map_err(|_| invalid())
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        let scale = self.scale as usize;
        if scale == 0 {
            return f.write_str(&self.digits);
        }
        let padded = if self.digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - self.digits.len()), self.digits)
        } else {
            self.digits.clone()
        };
        let (int, frac) = padded.split_at(padded.len() - scale);
        write!(f, "{}.{}", int, frac)
    }
}

// =============================================================================
// Currency
// =============================================================================

/// ISO-4217 currency code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Currency(String);

impl Currency {
    /// Validate and wrap a three-letter upper-case code
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Currency(code))
        } else {
            Err(CoreError::InvalidCurrency(code))
        }
    }

    /// The currency code
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        for text in ["0", "1", "-1", "123.456", "-0.001", "0.50", "1000000000000000000000000.1"] {
            assert_eq!(dec(text).to_string(), text);
        }
    }

    #[test]
    fn test_parse_leading_dot() {
        assert_eq!(dec(".5").to_string(), "0.5");
        assert_eq!(dec("-.25").to_string(), "-0.25");
    }

    #[test]
    fn test_scale_sensitive_equality() {
        assert_ne!(dec("1.0"), dec("1.00"));
        assert_eq!(dec("1.0").scale(), 1);
        assert_eq!(dec("001.5"), dec("1.5"));
    }

    #[test]
    fn test_negative_zero_normalized() {
        let z = dec("-0.00");
        assert!(z.is_zero());
        assert!(!z.is_negative());
        assert_eq!(z.to_string(), "0.00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "-", "1.", "1.2.3", "abc", "1e5", "--1", "1.-2"] {
            assert!(text.parse::<BigDecimal>().is_err(), "{text} should fail");
        }
    }

    #[test]
    fn test_unscaled_roundtrip() {
        let d = dec("-12.345");
        assert_eq!(d.unscaled(), "-12345");
        assert_eq!(BigDecimal::from_unscaled(&d.unscaled(), d.scale()).unwrap(), d);
    }

    #[test]
    fn test_currency_validation() {
        assert_eq!(Currency::new("GBP").unwrap().code(), "GBP");
        assert!(Currency::new("gbp").is_err());
        assert!(Currency::new("EURO").is_err());
    }

    proptest::proptest! {
        #[test]
        fn test_display_parse_roundtrip(unscaled in proptest::num::i64::ANY, scale in 0u32..24) {
            let d = BigDecimal::from_unscaled(&unscaled.to_string(), scale).unwrap();
            proptest::prop_assert_eq!(dec(&d.to_string()), d);
        }
    }
}
