//! Currency codes, pairs and the rate map produced by a batch run

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

macro_rules! currency_codes {
    ($($code:ident),+ $(,)?) => {
        /// A recognized ISO 4217 currency code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum CurrencyCode {
            $($code),+
        }

        impl CurrencyCode {
            /// Every recognized code, in canonical order.
            pub const ALL: &'static [CurrencyCode] = &[$(CurrencyCode::$code),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$code => stringify!($code)),+
                }
            }
        }

        impl FromStr for CurrencyCode {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_uppercase().as_str() {
                    $(stringify!($code) => Ok(CurrencyCode::$code),)+
                    _ => Err(anyhow!("Unrecognized currency code: {}", s)),
                }
            }
        }
    };
}

currency_codes!(
    USD, EUR, GBP, JPY, AUD, CAD, CHF, CNY, HKD, NZD, SEK, KRW, SGD, NOK, MXN, INR, RUB, ZAR, TRY,
    BRL, TWD, DKK, PLN, THB, IDR, HUF, CZK, ILS, CLP, PHP, AED, SAR, MYR, RON, BGN, HRK, PKR, ISK,
    VND, EGP,
);

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CurrencyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An ordered (base, quote) pair of distinct currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    base: CurrencyCode,
    quote: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(base: CurrencyCode, quote: CurrencyCode) -> Result<Self> {
        if base == quote {
            bail!("Currency pair requires distinct codes, got {base} twice");
        }
        Ok(Self { base, quote })
    }

    pub fn base(&self) -> CurrencyCode {
        self.base
    }

    pub fn quote(&self) -> CurrencyCode {
        self.quote
    }

    /// Display key used in the rate map, e.g. `EUR / USD`.
    pub fn key(&self) -> String {
        format!("{} / {}", self.base, self.quote)
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.base, self.quote)
    }
}

/// Enumerates every ordered pair of distinct codes.
///
/// Order follows the input order (base-major) and repeated codes are ignored,
/// so the same input always yields the same universe.
pub fn pair_universe(codes: &[CurrencyCode]) -> Vec<CurrencyPair> {
    let mut unique: Vec<CurrencyCode> = Vec::with_capacity(codes.len());
    for code in codes {
        if !unique.contains(code) {
            unique.push(*code);
        }
    }

    unique
        .iter()
        .flat_map(|base| {
            unique
                .iter()
                .filter_map(move |quote| CurrencyPair::new(*base, *quote).ok())
        })
        .collect()
}

/// Returns true when `rate` may be stored in a [`RateMap`].
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Latest known rate per pair, keyed by `"<BASE> / <QUOTE>"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateMap {
    rates: BTreeMap<String, f64>,
}

impl RateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `rate` for `pair`. Non-positive or non-finite rates are rejected
    /// and the map is left unchanged.
    pub fn insert(&mut self, pair: &CurrencyPair, rate: f64) -> bool {
        if !is_valid_rate(rate) {
            return false;
        }
        self.rates.insert(pair.key(), rate);
        true
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.rates.get(key).copied()
    }

    pub fn contains(&self, pair: &CurrencyPair) -> bool {
        self.rates.contains_key(&pair.key())
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CurrencyCode::*;

    #[test]
    fn test_code_parsing() {
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), EUR);
        assert_eq!(" JPY ".parse::<CurrencyCode>().unwrap(), JPY);
        let err = "INVALID".parse::<CurrencyCode>().unwrap_err();
        assert_eq!(err.to_string(), "Unrecognized currency code: INVALID");
    }

    #[test]
    fn test_all_codes_round_trip_through_strings() {
        assert_eq!(CurrencyCode::ALL.len(), 40);
        for code in CurrencyCode::ALL {
            assert_eq!(code.as_str().parse::<CurrencyCode>().unwrap(), *code);
        }
    }

    #[test]
    fn test_pair_rejects_same_currency() {
        assert!(CurrencyPair::new(USD, USD).is_err());
        let pair = CurrencyPair::new(EUR, USD).unwrap();
        assert_eq!(pair.key(), "EUR / USD");
        assert_eq!(pair.to_string(), "EUR / USD");
    }

    #[test]
    fn test_pair_universe_excludes_same_currency_pairs() {
        let universe = pair_universe(CurrencyCode::ALL);
        let n = CurrencyCode::ALL.len();
        assert_eq!(universe.len(), n * (n - 1));
        assert!(universe.iter().all(|p| p.base() != p.quote()));
    }

    #[test]
    fn test_pair_universe_is_deterministic_and_ignores_duplicates() {
        let universe = pair_universe(&[EUR, USD, EUR, JPY]);
        let keys: Vec<String> = universe.iter().map(|p| p.key()).collect();
        assert_eq!(
            keys,
            vec![
                "EUR / USD",
                "EUR / JPY",
                "USD / EUR",
                "USD / JPY",
                "JPY / EUR",
                "JPY / USD"
            ]
        );
        assert_eq!(universe, pair_universe(&[EUR, USD, EUR, JPY]));
        assert!(pair_universe(&[EUR]).is_empty());
    }

    #[test]
    fn test_rate_map_rejects_invalid_rates() {
        let pair = CurrencyPair::new(EUR, USD).unwrap();
        let mut rates = RateMap::new();
        assert!(!rates.insert(&pair, 0.0));
        assert!(!rates.insert(&pair, -1.5));
        assert!(!rates.insert(&pair, f64::NAN));
        assert!(!rates.insert(&pair, f64::INFINITY));
        assert!(rates.is_empty());

        assert!(rates.insert(&pair, 1.0576));
        assert_eq!(rates.get("EUR / USD"), Some(1.0576));
        assert!(rates.contains(&pair));
    }

    #[test]
    fn test_rate_map_serializes_as_flat_object() {
        let mut rates = RateMap::new();
        rates.insert(&CurrencyPair::new(USD, JPY).unwrap(), 151.2);
        rates.insert(&CurrencyPair::new(EUR, USD).unwrap(), 1.0576);

        let json = serde_json::to_string(&rates).unwrap();
        assert_eq!(json, r#"{"EUR / USD":1.0576,"USD / JPY":151.2}"#);

        let parsed: RateMap = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rates);
    }
}
