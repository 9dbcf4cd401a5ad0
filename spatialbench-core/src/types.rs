// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! All types validate their invariants at creation time.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Benchmark query identifier: `q` followed by a positive integer without
/// leading zeros.
///
/// Ordering is numeric on the suffix, so `q2` sorts before `q10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QueryId {
    name: String,
    number: u32,
}

impl QueryId {
    /// Create a new QueryId with validation.
    pub fn new(id: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = id.into();
        let invalid = || HardValidationError::InvalidQueryId {
            value: name.clone(),
        };

        let digits = name.strip_prefix('q').ok_or_else(invalid)?;
        if digits.is_empty()
            || digits.starts_with('0')
            || !digits.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        let number = digits.parse::<u32>().map_err(|_| invalid())?;

        Ok(Self { name, number })
    }

    /// Build the identifier for query number `number` (must be positive).
    pub fn from_number(number: u32) -> Result<Self, HardValidationError> {
        Self::new(format!("q{}", number))
    }

    /// The canonical identifiers `q1..=qN`.
    pub fn sequence(count: u32) -> Vec<QueryId> {
        (1..=count)
            .map(|number| QueryId {
                name: format!("q{}", number),
                number,
            })
            .collect()
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Numeric suffix used for display ordering.
    pub fn number(&self) -> u32 {
        self.number
    }
}

impl Ord for QueryId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number.cmp(&other.number)
    }
}

impl PartialOrd for QueryId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for QueryId {
    type Err = HardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for QueryId {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QueryId> for String {
    fn from(id: QueryId) -> Self {
        id.name
    }
}

/// Benchmark dataset size multiplier. Must be finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// Create a new ScaleFactor with validation.
    pub fn new(value: f64) -> Result<Self, HardValidationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "scale_factor",
                value: value.to_string(),
                reason: "Scale factor must be a positive number".to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Get the inner value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(1.0)
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<f64> for ScaleFactor {
    type Error = HardValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScaleFactor> for f64 {
    fn from(sf: ScaleFactor) -> Self {
        sf.0
    }
}

/// Number of passes over the query suite. At least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct IterationCount(u32);

impl IterationCount {
    /// Create a new IterationCount with validation.
    pub fn new(value: u32) -> Result<Self, HardValidationError> {
        if value == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "iterations",
                value: "0".to_string(),
                reason: "Iteration count must be at least 1".to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Get the inner value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for IterationCount {
    fn default() -> Self {
        Self(3)
    }
}

impl fmt::Display for IterationCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for IterationCount {
    type Error = HardValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IterationCount> for u32 {
    fn from(count: IterationCount) -> Self {
        count.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_id_valid() {
        let id = QueryId::new("q12").unwrap();
        assert_eq!(id.as_str(), "q12");
        assert_eq!(id.number(), 12);
    }

    #[test]
    fn test_query_id_invalid() {
        for bad in ["", "q", "q0", "q01", "Q1", "x1", "q1a", "q-1", "1"] {
            assert!(QueryId::new(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_query_id_numeric_ordering() {
        let mut ids: Vec<QueryId> = ["q10", "q2", "q1", "q12", "q3"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        ids.sort();
        let names: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(names, vec!["q1", "q2", "q3", "q10", "q12"]);
    }

    #[test]
    fn test_query_id_sequence() {
        let ids = QueryId::sequence(12);
        assert_eq!(ids.len(), 12);
        assert_eq!(ids[0].as_str(), "q1");
        assert_eq!(ids[11].as_str(), "q12");
    }

    #[test]
    fn test_query_id_serde_as_string() {
        let id = QueryId::new("q7").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"q7\"");
        let back: QueryId = serde_json::from_str("\"q7\"").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<QueryId>("\"bogus\"").is_err());
    }

    #[test]
    fn test_scale_factor_validation() {
        assert!(ScaleFactor::new(0.0).is_err());
        assert!(ScaleFactor::new(-1.0).is_err());
        assert!(ScaleFactor::new(f64::NAN).is_err());
        assert_eq!(ScaleFactor::new(10.0).unwrap().value(), 10.0);
    }

    #[test]
    fn test_iteration_count_validation() {
        assert!(IterationCount::new(0).is_err());
        assert_eq!(IterationCount::new(5).unwrap().value(), 5);
        assert_eq!(IterationCount::default().value(), 3);
    }
}
