//! Donation display in the local currency's terms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const USD_RATE: f64 = 76.12;
pub const EUR_RATE: f64 = 89.54;

/// Donation currency. `Rub` is the local currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Rub,
    Usd,
    Eur,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown currency code '{code}', expected one of: rub, usd, eur")]
pub struct UnknownCurrencyError {
    pub code: String,
}

impl Currency {
    pub fn as_str(self) -> &'static str {
        match self {
            Currency::Rub => "rub",
            Currency::Usd => "usd",
            Currency::Eur => "eur",
        }
    }

    /// Units of the local currency per unit of this one
    pub fn rate(self) -> f64 {
        match self {
            Currency::Rub => 1.0,
            Currency::Usd => USD_RATE,
            Currency::Eur => EUR_RATE,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Currency::Rub => "руб",
            Currency::Usd => "USD",
            Currency::Eur => "Euro",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = UnknownCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rub" => Ok(Currency::Rub),
            "usd" => Ok(Currency::Usd),
            "eur" => Ok(Currency::Eur),
            other => Err(UnknownCurrencyError {
                code: other.to_string(),
            }),
        }
    }
}

/// Rounds to cents on the exact binary value, ties to even.
fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// `"Sum of donation: {value} {unit}"` with `value = round(amount / rate, 2)`.
///
/// Whole values keep one decimal place, so 100 USD reads `100.0 USD`.
pub fn normalize(amount: f64, currency: Currency) -> String {
    format!(
        "Sum of donation: {:?} {}",
        round2(amount / currency.rate()),
        currency.unit()
    )
}

/// [`normalize`] for a raw currency code.
pub fn describe_donation(amount: f64, code: &str) -> Result<String, UnknownCurrencyError> {
    Ok(normalize(amount, code.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_conversion() {
        assert_eq!(normalize(7612.0, Currency::Usd), "Sum of donation: 100.0 USD");
    }

    #[test]
    fn test_eur_conversion_rounds_to_cents() {
        // 1000 / 89.54 = 11.168...
        assert_eq!(normalize(1000.0, Currency::Eur), "Sum of donation: 11.17 Euro");
    }

    #[test]
    fn test_local_currency_is_unchanged() {
        assert_eq!(normalize(250.5, Currency::Rub), "Sum of donation: 250.5 руб");
        assert_eq!(normalize(0.0, Currency::Rub), "Sum of donation: 0.0 руб");
    }

    #[test]
    fn test_half_cent_ties_round_to_even() {
        assert_eq!(normalize(0.125, Currency::Rub), "Sum of donation: 0.12 руб");
        assert_eq!(normalize(0.375, Currency::Rub), "Sum of donation: 0.38 руб");
        // 1.115 is stored just below the tie
        assert_eq!(normalize(1.115, Currency::Rub), "Sum of donation: 1.11 руб");
    }

    #[test]
    fn test_large_donation_stays_finite() {
        assert_eq!(normalize(1e308, Currency::Rub), "Sum of donation: 1e308 руб");
    }

    #[test]
    fn test_unknown_code_fails_fast() {
        let err = describe_donation(10.0, "gbp").unwrap_err();
        assert_eq!(err.code, "gbp");
        assert!("USD".parse::<Currency>().is_err());
    }

    #[test]
    fn test_describe_known_code() {
        assert_eq!(
            describe_donation(7612.0, "usd").unwrap(),
            "Sum of donation: 100.0 USD"
        );
    }

    #[test]
    fn test_serde_codes() {
        assert_eq!(serde_json::to_string(&Currency::Eur).unwrap(), "\"eur\"");
        assert_eq!(serde_json::from_str::<Currency>("\"usd\"").unwrap(), Currency::Usd);
        assert!(serde_json::from_str::<Currency>("\"gbp\"").is_err());
        assert_eq!(Currency::default(), Currency::Rub);
    }
}
