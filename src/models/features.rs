use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// The eight agronomic inputs every crop prediction consumes. Units and
/// valid ranges:
///
/// - nitrogen / phosphorus / potassium: kg/ha, 0..=200
/// - temperature: degrees Celsius, -10..=60
/// - humidity: percent, 0..=100
/// - ph: 3..=10
/// - rainfall: mm, 0..=500
/// - ozone: ppb, 0..=100
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureVector {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
    pub ozone: f64,
}

impl FeatureVector {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_range("nitrogen", self.nitrogen, 0.0, 200.0)?;
        check_range("phosphorus", self.phosphorus, 0.0, 200.0)?;
        check_range("potassium", self.potassium, 0.0, 200.0)?;
        check_range("temperature", self.temperature, -10.0, 60.0)?;
        check_range("humidity", self.humidity, 0.0, 100.0)?;
        check_range("ph", self.ph, 3.0, 10.0)?;
        check_range("rainfall", self.rainfall, 0.0, 500.0)?;
        check_range("ozone", self.ozone, 0.0, 100.0)?;
        Ok(())
    }

    /// Name/value pairs in the order the crop artifact was trained with.
    pub fn named(&self) -> Vec<(String, f64)> {
        vec![
            ("nitrogen".into(), self.nitrogen),
            ("phosphorus".into(), self.phosphorus),
            ("potassium".into(), self.potassium),
            ("temperature".into(), self.temperature),
            ("humidity".into(), self.humidity),
            ("ph".into(), self.ph),
            ("rainfall".into(), self.rainfall),
            ("ozone".into(), self.ozone),
        ]
    }
}

/// Partial feature set carried by location-based requests. Any field the
/// user filled in wins over the resolved value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FeatureOverrides {
    pub nitrogen: Option<f64>,
    pub phosphorus: Option<f64>,
    pub potassium: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub ph: Option<f64>,
    pub rainfall: Option<f64>,
    pub ozone: Option<f64>,
}

impl FeatureOverrides {
    /// True when nothing needs resolving.
    pub fn is_complete(&self) -> bool {
        self.nitrogen.is_some()
            && self.phosphorus.is_some()
            && self.potassium.is_some()
            && self.temperature.is_some()
            && self.humidity.is_some()
            && self.ph.is_some()
            && self.rainfall.is_some()
            && self.ozone.is_some()
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        check_opt("nitrogen", self.nitrogen, 0.0, 200.0)?;
        check_opt("phosphorus", self.phosphorus, 0.0, 200.0)?;
        check_opt("potassium", self.potassium, 0.0, 200.0)?;
        check_opt("temperature", self.temperature, -10.0, 60.0)?;
        check_opt("humidity", self.humidity, 0.0, 100.0)?;
        check_opt("ph", self.ph, 3.0, 10.0)?;
        check_opt("rainfall", self.rainfall, 0.0, 500.0)?;
        check_opt("ozone", self.ozone, 0.0, 100.0)?;
        Ok(())
    }

    /// Fill the gaps from `fallback`, keeping every user-supplied value.
    pub fn merge(&self, fallback: &FeatureVector) -> FeatureVector {
        FeatureVector {
            nitrogen: self.nitrogen.unwrap_or(fallback.nitrogen),
            phosphorus: self.phosphorus.unwrap_or(fallback.phosphorus),
            potassium: self.potassium.unwrap_or(fallback.potassium),
            temperature: self.temperature.unwrap_or(fallback.temperature),
            humidity: self.humidity.unwrap_or(fallback.humidity),
            ph: self.ph.unwrap_or(fallback.ph),
            rainfall: self.rainfall.unwrap_or(fallback.rainfall),
            ozone: self.ozone.unwrap_or(fallback.ozone),
        }
    }
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), ApiError> {
    check_range("latitude", latitude, -90.0, 90.0)?;
    check_range("longitude", longitude, -180.0, 180.0)?;
    Ok(())
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ApiError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ApiError::Validation {
            field: field.to_string(),
            message: format!("{field} must be between {min} and {max}, got {value}"),
        });
    }
    Ok(())
}

fn check_opt(field: &str, value: Option<f64>, min: f64, max: f64) -> Result<(), ApiError> {
    match value {
        Some(v) => check_range(field, v, min, max),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_range() -> FeatureVector {
        FeatureVector {
            nitrogen: 90.0,
            phosphorus: 42.0,
            potassium: 43.0,
            temperature: 20.87,
            humidity: 82.0,
            ph: 6.5,
            rainfall: 202.93,
            ozone: 30.0,
        }
    }

    #[test]
    fn accepts_values_within_documented_ranges() {
        assert!(in_range().validate().is_ok());
    }

    #[test]
    fn rejects_ph_out_of_range_with_field_detail() {
        let features = FeatureVector {
            ph: 11.0,
            ..in_range()
        };
        match features.validate() {
            Err(ApiError::Validation { field, .. }) => assert_eq!(field, "ph"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_finite_values() {
        let features = FeatureVector {
            rainfall: f64::NAN,
            ..in_range()
        };
        assert!(features.validate().is_err());
    }

    #[test]
    fn user_supplied_value_wins_over_fallback() {
        let overrides = FeatureOverrides {
            nitrogen: Some(12.0),
            ..Default::default()
        };
        let merged = overrides.merge(&in_range());
        assert_eq!(merged.nitrogen, 12.0);
        assert_eq!(merged.phosphorus, 42.0);
    }

    #[test]
    fn coordinates_outside_geographic_ranges_are_rejected() {
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, -181.0).is_err());
        assert!(validate_coordinates(28.6139, 77.209).is_ok());
    }
}
