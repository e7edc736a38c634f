//! Quote domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// One daily OHLCV bar as delivered by a quote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    /// Rejects bars whose high/low envelope does not contain open and close.
    pub fn validate(&self) -> Result<()> {
        if self.low > self.high
            || self.open > self.high
            || self.open < self.low
            || self.close > self.high
            || self.close < self.low
        {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "inconsistent OHLC on {}: o={} h={} l={} c={}",
                self.date, self.open, self.high, self.low, self.close
            ))));
        }
        if self.volume.is_sign_negative() {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "negative volume on {}",
                self.date
            ))));
        }
        Ok(())
    }
}

/// A stored daily quote. Identity is (contract_id, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub contract_id: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Quote {
    pub fn from_bar(contract_id: &str, bar: Bar) -> Self {
        Self {
            contract_id: contract_id.to_string(),
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open,
            high,
            low,
            close,
            volume: dec!(1000),
        }
    }

    #[test]
    fn test_bar_validate_accepts_consistent_ohlc() {
        assert!(bar(dec!(10), dec!(12), dec!(9), dec!(11)).validate().is_ok());
    }

    #[test]
    fn test_bar_validate_rejects_close_outside_range() {
        assert!(bar(dec!(10), dec!(12), dec!(9), dec!(13)).validate().is_err());
        assert!(bar(dec!(10), dec!(9), dec!(12), dec!(10)).validate().is_err());
    }

    #[test]
    fn test_quote_from_bar_keeps_fields() {
        let b = bar(dec!(10), dec!(12), dec!(9), dec!(11));
        let q = Quote::from_bar("c-1", b.clone());
        assert_eq!(q.contract_id, "c-1");
        assert_eq!(q.date, b.date);
        assert_eq!(q.close, dec!(11));
    }
}
