//! Recoverable, per-unit data conditions
//!
//! None of these abort a run. Each is attached to the unit (and period) it
//! concerns so the remaining units are processed normally.

use crate::temporal::Period;
use serde::Serialize;
use std::fmt;

/// Scope label for issues that concern a whole raster grid rather than one unit
pub const GRID_SCOPE: &str = "grid";

/// Why a baseline could not be used as a denominator
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BaselineProblem {
    /// No observation fell inside the baseline window
    NoObservations,
    /// Baseline exists but is not above the minimum-signal threshold
    BelowThreshold { baseline: f64, threshold: f64 },
}

/// A recoverable condition found while processing one unit or period
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "issue")]
pub enum DataIssue {
    /// Percent-change for this unit is undefined
    UndefinedBaseline {
        unit: String,
        problem: BaselineProblem,
    },
    /// Unit footprint has no defined cell in the raster for `period`
    SpatialMismatch {
        unit: String,
        period: Option<Period>,
    },
    /// An expected period has no observation
    MissingPeriod { unit: String, period: Period },
}

impl DataIssue {
    /// The unit this issue concerns
    pub fn unit(&self) -> &str {
        match self {
            DataIssue::UndefinedBaseline { unit, .. }
            | DataIssue::SpatialMismatch { unit, .. }
            | DataIssue::MissingPeriod { unit, .. } => unit,
        }
    }
}

impl fmt::Display for DataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIssue::UndefinedBaseline {
                unit,
                problem: BaselineProblem::NoObservations,
            } => write!(f, "{unit}: no observation inside the baseline window"),
            DataIssue::UndefinedBaseline {
                unit,
                problem: BaselineProblem::BelowThreshold { baseline, threshold },
            } => write!(
                f,
                "{unit}: baseline {baseline} is not above threshold {threshold}"
            ),
            DataIssue::SpatialMismatch { unit, period: Some(p) } => {
                write!(f, "{unit}: no defined cells inside the boundary for {p}")
            }
            DataIssue::SpatialMismatch { unit, period: None } => {
                write!(f, "{unit}: no defined cells inside the boundary")
            }
            DataIssue::MissingPeriod { unit, period } => {
                write!(f, "{unit}: no observation for {period}")
            }
        }
    }
}
