use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

pub const INR_CURRENCY_CODE: &str = "INR";

const PAISE_PER_RUPEE: i64 = 100;

//--------------------------------------      Rupees       -----------------------------------------------------------
/// A monetary amount in Indian rupees, held as an integer number of paise.
///
/// Payment gateways hand amounts over as decimal strings ("999.00"). Those strings are parsed into paise on receipt
/// and never touched as floating point, so no rounding is introduced beyond the precision the gateway provided.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Rupees(i64);

impl Rupees {
    pub fn from_paise(paise: i64) -> Self {
        Self(paise)
    }

    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * PAISE_PER_RUPEE)
    }

    /// The amount in paise.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Render the amount the way the gateways expect it: two decimal places, no separators.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        format!("{sign}{}.{:02}", abs / PAISE_PER_RUPEE, abs % PAISE_PER_RUPEE)
    }
}

impl Add for Rupees {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Rupees {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i64> for Rupees {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Rupees {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl Display for Rupees {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "₹{}", self.to_decimal_string())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in rupees: {0}")]
pub struct RupeesConversionError(String);

impl FromStr for Rupees {
    type Err = RupeesConversionError;

    /// Parses a gateway-style decimal string ("999.00", "999.5", "999") into paise.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (sign, digits) = match s.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, s),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(RupeesConversionError(format!("'{s}' is not a decimal amount")));
        }
        if frac.len() > 2 {
            return Err(RupeesConversionError(format!("'{s}' has sub-paise precision")));
        }
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| RupeesConversionError(format!("'{s}' is not a decimal amount")))?
        };
        let paise: i64 = if frac.is_empty() {
            0
        } else {
            // "5" means 50 paise, "05" means 5 paise
            let padded = format!("{frac:0<2}");
            padded.parse().map_err(|_| RupeesConversionError(format!("'{s}' is not a decimal amount")))?
        };
        let total = whole
            .checked_mul(PAISE_PER_RUPEE)
            .and_then(|w| w.checked_add(paise))
            .ok_or_else(|| RupeesConversionError(format!("'{s}' is too large to represent in paise")))?;
        Ok(Self(sign * total))
    }
}

impl From<i64> for Rupees {
    fn from(paise: i64) -> Self {
        Self(paise)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_gateway_amounts() {
        assert_eq!("999.00".parse::<Rupees>().unwrap(), Rupees::from_paise(99_900));
        assert_eq!("999.5".parse::<Rupees>().unwrap(), Rupees::from_paise(99_950));
        assert_eq!("999.05".parse::<Rupees>().unwrap(), Rupees::from_paise(99_905));
        assert_eq!("999".parse::<Rupees>().unwrap(), Rupees::from_paise(99_900));
        assert_eq!("0.01".parse::<Rupees>().unwrap(), Rupees::from_paise(1));
        assert_eq!("-12.34".parse::<Rupees>().unwrap(), Rupees::from_paise(-1_234));
    }

    #[test]
    fn reject_malformed_amounts() {
        assert!("".parse::<Rupees>().is_err());
        assert!(".".parse::<Rupees>().is_err());
        assert!("12.345".parse::<Rupees>().is_err());
        assert!("twelve".parse::<Rupees>().is_err());
    }

    #[test]
    fn overflowing_amounts_are_rejected() {
        assert!("92233720368547758.08".parse::<Rupees>().is_err());
        assert!("99999999999999999999".parse::<Rupees>().is_err());
    }

    #[test]
    fn decimal_round_trip() {
        let amount = "1050.07".parse::<Rupees>().unwrap();
        assert_eq!(amount.to_decimal_string(), "1050.07");
        assert_eq!(format!("{amount}"), "₹1050.07");
    }

    #[test]
    fn arithmetic() {
        let a = Rupees::from_rupees(500);
        let b = Rupees::from_rupees(200);
        assert_eq!(a + b, Rupees::from_rupees(700));
        assert_eq!(a - b, Rupees::from_rupees(300));
        assert_eq!(b * 3, Rupees::from_rupees(600));
        assert_eq!(vec![a, b].into_iter().sum::<Rupees>(), Rupees::from_rupees(700));
    }
}
