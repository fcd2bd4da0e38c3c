//! Market options and fee schedule
//!
//! Options are provisioned once per market and stay immutable for the
//! lifetime of the engine that serves it. Changing a precision means
//! building a new engine.

use crate::errors::ConfigError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Precision used by the dust filter when the ask fee does not set one
pub const DEFAULT_PRECISION: u32 = 8;

/// Largest decimal scale representable by `Decimal`
pub const MAX_PRECISION: u32 = 28;

/// Fee schedule for one side of a market
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fee {
    /// Fee rate
    pub fee: Decimal,
    /// Currency the fee is charged in
    pub currency: String,
    /// Decimal precision override for this side
    pub fixed: Option<u32>,
}

/// Market configuration supplied at engine construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub id: u64,
    pub code: String,
    pub name: String,
    pub base_unit: String,
    pub quote_unit: String,
    pub price_group_fixed: u32,
    pub bid: Fee,
    pub ask: Fee,
    pub sort_order: i32,
    /// Dust-filter precision when `ask.fixed` is unset
    pub default_precision: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            id: 0,
            code: String::new(),
            name: String::new(),
            base_unit: String::new(),
            quote_unit: String::new(),
            price_group_fixed: 0,
            bid: Fee::default(),
            ask: Fee::default(),
            sort_order: 0,
            default_precision: DEFAULT_PRECISION,
        }
    }
}

impl Options {
    /// Parse and validate options from a JSON document.
    ///
    /// Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Options = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check every precision fits a `Decimal` scale
    pub fn validate(&self) -> Result<(), ConfigError> {
        let precisions = [
            Some(self.default_precision),
            Some(self.price_group_fixed),
            self.ask.fixed,
            self.bid.fixed,
        ];
        for fixed in precisions.into_iter().flatten() {
            if fixed > MAX_PRECISION {
                return Err(ConfigError::PrecisionOutOfRange {
                    fixed,
                    max: MAX_PRECISION,
                });
            }
        }
        Ok(())
    }

    /// Precision of the smallest tradable volume
    pub fn volume_precision(&self) -> u32 {
        self.ask
            .fixed
            .unwrap_or(self.default_precision)
            .min(MAX_PRECISION)
    }

    /// Smallest tradable volume: `10^-fixed`
    pub fn min_volume(&self) -> Decimal {
        Decimal::new(1, self.volume_precision())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_default_min_volume() {
        let options = Options::default();
        assert_eq!(options.volume_precision(), DEFAULT_PRECISION);
        assert_eq!(options.min_volume(), Decimal::from_str("0.00000001").unwrap());
    }

    #[test]
    fn test_ask_fixed_overrides_default() {
        let mut options = Options::default();
        options.ask.fixed = Some(2);
        assert_eq!(options.min_volume(), Decimal::from_str("0.01").unwrap());

        options.ask.fixed = Some(0);
        assert_eq!(options.min_volume(), Decimal::ONE);
    }

    #[test]
    fn test_bid_fixed_is_ignored_for_dust() {
        let mut options = Options::default();
        options.bid.fixed = Some(2);
        assert_eq!(options.volume_precision(), DEFAULT_PRECISION);
    }

    #[test]
    fn test_from_json_partial() {
        let options = Options::from_json(
            r#"{
                "id": 7,
                "code": "btcusdt",
                "base_unit": "btc",
                "quote_unit": "usdt",
                "ask": { "fee": "0.002", "currency": "usdt", "fixed": 4 }
            }"#,
        )
        .unwrap();

        assert_eq!(options.id, 7);
        assert_eq!(options.ask.fee, Decimal::from_str("0.002").unwrap());
        assert_eq!(options.ask.fixed, Some(4));
        assert_eq!(options.bid, Fee::default());
        assert_eq!(options.default_precision, DEFAULT_PRECISION);
    }

    #[test]
    fn test_from_json_rejects_huge_precision() {
        let err = Options::from_json(r#"{ "ask": { "fixed": 40 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::PrecisionOutOfRange { fixed: 40, .. }));
    }

    #[test]
    fn test_from_json_malformed() {
        let err = Options::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }
}
