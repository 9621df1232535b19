use crate::error::IngestError;

/// Exact base-10 number: `mantissa × 10^exponent`.
///
/// Telemetry values travel the whole decode path in this form and are never
/// routed through a binary float, so `282.683` stays `282.683` and not the
/// nearest `f64`. The exponent is signed; the legacy-producer sign defect is
/// corrected by the version normalizer, not here.
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    pub mantissa: i128,
    pub exponent: i32,
}

impl Decimal {
    pub const fn new(mantissa: i128, exponent: i32) -> Self {
        Self { mantissa, exponent }
    }

    pub const fn from_int(value: i64) -> Self {
        Self { mantissa: value as i128, exponent: 0 }
    }

    /// Parse a plain or scientific decimal literal (`-12.34`, `1e-7`)
    /// without any float intermediate.
    pub fn parse_str(s: &str) -> Result<Self, IngestError> {
        let bad = || IngestError::decode(format!("invalid decimal literal `{s}`"));

        let (body, exp_part) = match s.find(['e', 'E']) {
            Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
            None => (s, None),
        };

        let (negative, digits) = match body.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, body.strip_prefix('+').unwrap_or(body)),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(bad());
        }

        let mut mantissa: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let d = c.to_digit(10).ok_or_else(bad)? as i128;
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(d))
                .ok_or_else(bad)?;
        }
        if negative {
            mantissa = -mantissa;
        }

        let mut exponent: i32 = match exp_part {
            Some(e) if !e.is_empty() => e.parse().map_err(|_| bad())?,
            Some(_) => return Err(bad()),
            None => 0,
        };
        exponent = exponent
            .checked_sub(i32::try_from(frac_part.len()).map_err(|_| bad())?)
            .ok_or_else(bad)?;

        Ok(Self { mantissa, exponent })
    }

    /// Exact conversion to `i64`. `None` when the value has a fractional
    /// part or does not fit.
    pub fn to_i64(&self) -> Option<i64> {
        let mut mantissa = self.mantissa;
        let mut exponent = self.exponent;
        while exponent > 0 && mantissa != 0 {
            mantissa = mantissa.checked_mul(10)?;
            exponent -= 1;
        }
        while exponent < 0 {
            if mantissa % 10 != 0 {
                return None;
            }
            mantissa /= 10;
            exponent += 1;
        }
        i64::try_from(mantissa).ok()
    }

    /// Canonical form with trailing zeros folded into the exponent.
    fn normalized(&self) -> (i128, i32) {
        let mut mantissa = self.mantissa;
        let mut exponent = self.exponent;
        if mantissa == 0 {
            return (0, 0);
        }
        while mantissa % 10 == 0 {
            mantissa /= 10;
            exponent += 1;
        }
        (mantissa, exponent)
    }
}

/// Value equality: `282.6830` == `282.683`, `1e3` == `1000`.
impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Decimal {}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.exponent >= 0 {
            if self.mantissa == 0 {
                return f.write_str("0");
            }
            write!(f, "{}", self.mantissa)?;
            for _ in 0..self.exponent {
                f.write_str("0")?;
            }
            return Ok(());
        }

        let scale = self.exponent.unsigned_abs() as usize;
        let negative = self.mantissa < 0;
        let mut digits = self.mantissa.unsigned_abs().to_string();
        if digits.len() <= scale {
            let pad = scale - digits.len() + 1;
            digits = format!("{}{digits}", "0".repeat(pad));
        }
        let split = digits.len() - scale;
        if negative {
            f.write_str("-")?;
        }
        write!(f, "{}.{}", &digits[..split], &digits[split..])
    }
}

impl serde::Serialize for Decimal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_literals() {
        assert_eq!(Decimal::parse_str("282.683").unwrap(), Decimal::new(282683, -3));
        assert_eq!(Decimal::parse_str("-0.001").unwrap(), Decimal::new(-1, -3));
        assert_eq!(Decimal::parse_str("42").unwrap(), Decimal::new(42, 0));
        assert_eq!(Decimal::parse_str("0.0").unwrap(), Decimal::new(0, 0));
    }

    #[test]
    fn parses_scientific_literals() {
        assert_eq!(Decimal::parse_str("1e-7").unwrap(), Decimal::new(1, -7));
        assert_eq!(Decimal::parse_str("1.5E3").unwrap(), Decimal::new(15, 2));
        assert_eq!(Decimal::parse_str("-2.5e-2").unwrap(), Decimal::new(-25, -3));
    }

    #[test]
    fn rejects_garbage() {
        for s in ["", ".", "1.2.3", "abc", "1e", "--1", "1x2"] {
            assert!(Decimal::parse_str(s).is_err(), "accepted `{s}`");
        }
    }

    #[test]
    fn displays_without_float_formatting() {
        assert_eq!(Decimal::new(282683, -3).to_string(), "282.683");
        assert_eq!(Decimal::new(-5, -4).to_string(), "-0.0005");
        assert_eq!(Decimal::new(7, 2).to_string(), "700");
        assert_eq!(Decimal::new(0, 5).to_string(), "0");
    }

    #[test]
    fn equality_ignores_representation() {
        assert_eq!(Decimal::new(1000, -1), Decimal::new(100, 0));
        assert_eq!(Decimal::new(2826830, -4), Decimal::new(282683, -3));
        assert_ne!(Decimal::new(282683, -3), Decimal::new(282683, 3));
    }

    #[test]
    fn exact_i64_conversion() {
        assert_eq!(Decimal::new(1714764000, 3).to_i64(), Some(1_714_764_000_000));
        assert_eq!(Decimal::new(1500, -2).to_i64(), Some(15));
        assert_eq!(Decimal::new(15, -1).to_i64(), None);
    }
}
