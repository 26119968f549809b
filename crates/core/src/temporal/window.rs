//! Baseline reference windows

use super::Period;
use crate::error::{Error, Result};
use serde::Serialize;

/// Ordered set of reference periods shared by every unit in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaselineWindow {
    /// Sorted, de-duplicated, never empty
    periods: Vec<Period>,
}

impl BaselineWindow {
    /// Window from an explicit set of periods (duplicates collapse)
    pub fn new<I: IntoIterator<Item = Period>>(periods: I) -> Result<Self> {
        let mut periods: Vec<Period> = periods.into_iter().collect();
        periods.sort();
        periods.dedup();
        if periods.is_empty() {
            return Err(Error::InvalidParameter {
                name: "baseline_window",
                value: "[]".into(),
                reason: "window must contain at least one period".into(),
            });
        }
        Ok(Self { periods })
    }

    /// `count` consecutive periods starting at `first`
    pub fn consecutive(first: Period, count: usize) -> Result<Self> {
        let mut periods = Vec::with_capacity(count);
        let mut cursor = Some(first);
        for _ in 0..count {
            match cursor {
                Some(p) => {
                    periods.push(p);
                    cursor = p.succ();
                }
                None => break,
            }
        }
        Self::new(periods)
    }

    /// The `count` periods immediately preceding `target`
    pub fn preceding(target: Period, count: usize) -> Result<Self> {
        Self::new(target.preceding(count))
    }

    pub fn contains(&self, period: &Period) -> bool {
        self.periods.binary_search(period).is_ok()
    }

    pub fn first(&self) -> Period {
        self.periods[0]
    }

    pub fn last(&self) -> Period {
        self.periods[self.periods.len() - 1]
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn iter(&self) -> impl Iterator<Item = &Period> {
        self.periods.iter()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}
