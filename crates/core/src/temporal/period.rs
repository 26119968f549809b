//! Acquisition periods (annual or monthly composites)

use crate::error::{Error, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Temporal grain of a composite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grain {
    Annual,
    Monthly,
}

impl Grain {
    fn step(self) -> Months {
        match self {
            Grain::Annual => Months::new(12),
            Grain::Monthly => Months::new(1),
        }
    }
}

/// An acquisition period label such as `2023` or `2023-01`.
///
/// Periods order by their first day, so a monthly series sorts
/// chronologically. Stepping (`succ`, `pred`) moves by the period's own grain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    start: NaiveDate,
    grain: Grain,
}

impl Period {
    /// Monthly period, `month` in 1..=12
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidPeriod(format!("{year}-{month:02}")))?;
        Ok(Self {
            start,
            grain: Grain::Monthly,
        })
    }

    /// Annual period
    pub fn year(year: i32) -> Result<Self> {
        let start =
            NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| Error::InvalidPeriod(year.to_string()))?;
        Ok(Self {
            start,
            grain: Grain::Annual,
        })
    }

    /// First day of the period
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn grain(&self) -> Grain {
        self.grain
    }

    /// Calendar year
    pub fn year_number(&self) -> i32 {
        self.start.year()
    }

    /// Calendar month (1..=12) for monthly periods
    pub fn month_number(&self) -> Option<u32> {
        match self.grain {
            Grain::Monthly => Some(self.start.month()),
            Grain::Annual => None,
        }
    }

    /// The next period at the same grain
    pub fn succ(&self) -> Option<Self> {
        self.start.checked_add_months(self.grain.step()).map(|start| Self {
            start,
            grain: self.grain,
        })
    }

    /// The previous period at the same grain
    pub fn pred(&self) -> Option<Self> {
        self.start.checked_sub_months(self.grain.step()).map(|start| Self {
            start,
            grain: self.grain,
        })
    }

    /// The `n` periods immediately preceding this one, oldest first
    pub fn preceding(&self, n: usize) -> Vec<Self> {
        let mut out = Vec::with_capacity(n);
        let mut cursor = *self;
        for _ in 0..n {
            match cursor.pred() {
                Some(p) => {
                    out.push(p);
                    cursor = p;
                }
                None => break,
            }
        }
        out.reverse();
        out
    }

    /// Consecutive periods from `first` to `last` inclusive.
    ///
    /// Both ends must share a grain; an inverted range is empty.
    pub fn range_inclusive(first: Period, last: Period) -> Result<Vec<Period>> {
        if first.grain != last.grain {
            return Err(Error::InvalidParameter {
                name: "range",
                value: format!("{first}..={last}"),
                reason: "periods have different grains".into(),
            });
        }
        let mut out = Vec::new();
        let mut cursor = Some(first);
        while let Some(p) = cursor {
            if p > last {
                break;
            }
            out.push(p);
            cursor = p.succ();
        }
        Ok(out)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.grain {
            Grain::Annual => write!(f, "{}", self.start.year()),
            Grain::Monthly => write!(f, "{}-{:02}", self.start.year(), self.start.month()),
        }
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::InvalidPeriod(s.to_string());
        let mut parts = s.split('-');

        let year: i32 = parts
            .next()
            .filter(|y| y.len() == 4)
            .and_then(|y| y.parse().ok())
            .ok_or_else(invalid)?;

        match (parts.next(), parts.next()) {
            (None, _) => Period::year(year),
            (Some(m), None) => {
                let month: u32 = m.parse().map_err(|_| invalid())?;
                Period::month(year, month).map_err(|_| invalid())
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Period {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(s: &str) -> Period {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(m("2023-01").to_string(), "2023-01");
        assert_eq!(m("2023-1").to_string(), "2023-01");
        assert_eq!(m("2024").to_string(), "2024");
        assert_eq!(m("2024").grain(), Grain::Annual);
        assert!("2023-13".parse::<Period>().is_err());
        assert!("23-01".parse::<Period>().is_err());
        assert!("2023-01-05".parse::<Period>().is_err());
    }

    #[test]
    fn stepping_crosses_year_boundary() {
        assert_eq!(m("2023-12").succ(), Some(m("2024-01")));
        assert_eq!(m("2024-01").pred(), Some(m("2023-12")));
        assert_eq!(m("2023").succ(), Some(m("2024")));
    }

    #[test]
    fn preceding_is_oldest_first() {
        let window = m("2023-03").preceding(4);
        let labels: Vec<String> = window.iter().map(|p| p.to_string()).collect();
        assert_eq!(labels, ["2022-11", "2022-12", "2023-01", "2023-02"]);
    }

    #[test]
    fn range_inclusive_requires_same_grain() {
        let r = Period::range_inclusive(m("2023-11"), m("2024-02")).unwrap();
        assert_eq!(r.len(), 4);
        assert!(Period::range_inclusive(m("2023"), m("2024-02")).is_err());
        assert!(Period::range_inclusive(m("2024-02"), m("2023-11")).unwrap().is_empty());
    }

    #[test]
    fn ordering_is_chronological() {
        let mut v = vec![m("2024-01"), m("2023-06"), m("2023-12")];
        v.sort();
        assert_eq!(v, vec![m("2023-06"), m("2023-12"), m("2024-01")]);
    }
}
