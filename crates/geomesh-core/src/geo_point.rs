//! Geographic value types shared by every crate in the workspace.
//!
//! Latitude/longitude are plain WGS-84 degrees. Both types validate on
//! construction so downstream code can assume finite, in-range values.

use serde::{Deserialize, Serialize};

use crate::CoreError;

const MAX_LATITUDE: f64 = 90.0;
const MAX_LONGITUDE: f64 = 180.0;

/// Checks that `value` is a finite latitude in `[-90, 90]`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidCoordinate`] naming the latitude otherwise.
pub fn validate_latitude(value: f64) -> Result<f64, CoreError> {
    check_range("latitude", value, MAX_LATITUDE)
}

/// Checks that `value` is a finite longitude in `[-180, 180]`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidCoordinate`] naming the longitude otherwise.
pub fn validate_longitude(value: f64) -> Result<f64, CoreError> {
    check_range("longitude", value, MAX_LONGITUDE)
}

fn check_range(field: &'static str, value: f64, limit: f64) -> Result<f64, CoreError> {
    if value.is_finite() && (-limit..=limit).contains(&value) {
        Ok(value)
    } else {
        Err(CoreError::InvalidCoordinate {
            field,
            value,
            limit,
        })
    }
}

/// A named node (school, hub) at a fixed location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a validated point.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] if either coordinate is
    /// non-finite or out of range.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        Ok(Self {
            name: name.into(),
            latitude: validate_latitude(latitude)?,
            longitude: validate_longitude(longitude)?,
        })
    }

    /// Re-checks the coordinates of a point that may have been built
    /// directly through its public fields or deserialized.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] for the first bad coordinate.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_latitude(self.latitude)?;
        validate_longitude(self.longitude)?;
        Ok(())
    }

    #[must_use]
    pub fn location(&self) -> QueryLocation {
        QueryLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A per-request query position. Not stored anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl QueryLocation {
    /// Creates a validated query location.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] if either coordinate is
    /// non-finite or out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        Ok(Self {
            latitude: validate_latitude(latitude)?,
            longitude: validate_longitude(longitude)?,
        })
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] for the first bad coordinate.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_latitude(self.latitude)?;
        validate_longitude(self.longitude)?;
        Ok(())
    }
}

impl std::fmt::Display for QueryLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}
