//! Value Objects for ratings and reviews

use serde::{Deserialize, Serialize};

use crate::EcommerceError;

/// Star score given to a product, 1 to 5 inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, EcommerceError> {
        if (Self::MIN..=Self::MAX).contains(&value) { Ok(Self(value)) } else { Err(Self::out_of_range()) }
    }

    /// Accepts numeric input as it arrives from JSON; fractional or non-finite values are rejected.
    pub fn from_input(value: Option<f64>) -> Result<Self, EcommerceError> {
        match value {
            Some(v) if v.is_finite() && v.fract() == 0.0 && v >= Self::MIN as f64 && v <= Self::MAX as f64 => Ok(Self(v as u8)),
            _ => Err(Self::out_of_range()),
        }
    }

    pub fn value(&self) -> u8 { self.0 }

    fn out_of_range() -> EcommerceError {
        EcommerceError::validation(format!("Rating must be an integer between {} and {}", Self::MIN, Self::MAX))
    }
}

/// Free-text review, never blank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewText(String);

impl ReviewText {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() { None } else { Some(Self(trimmed.to_string())) }
    }
    pub fn into_inner(self) -> String { self.0 }
}
