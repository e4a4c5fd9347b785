//! Request and response shapes exchanged with callers.

use serde::{Deserialize, Serialize};

use lift_core::model::SetRecord;

use crate::error::InputError;
use crate::progress::RegistrationResult;

/// A set report as submitted by the user: `{ "weight"?: number, "reps": number }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub reps: Option<i64>,
}

/// A report whose values passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidReport {
    pub weight: Option<f64>,
    pub reps: u32,
}

impl SetReport {
    #[must_use]
    pub fn new(weight: f64, reps: i64) -> Self {
        Self {
            weight: Some(weight),
            reps: Some(reps),
        }
    }

    /// Report without a weight; the service resolves one.
    #[must_use]
    pub fn reps_only(reps: i64) -> Self {
        Self {
            weight: None,
            reps: Some(reps),
        }
    }

    /// Check reps and the optional weight against `max_weight`.
    ///
    /// # Errors
    ///
    /// Returns `InputError` for missing or non-positive reps and for weights outside
    /// `0..=max_weight`.
    pub fn validate(&self, max_weight: f64) -> Result<ValidReport, InputError> {
        let raw = self.reps.ok_or(InputError::MissingReps)?;
        let reps = u32::try_from(raw)
            .ok()
            .filter(|r| *r > 0)
            .ok_or(InputError::InvalidReps(raw))?;
        let weight = self
            .weight
            .map(|w| validate_weight(w, max_weight))
            .transpose()?;
        Ok(ValidReport { weight, reps })
    }
}

/// Accept `weight` if it is finite and within `0..=max_weight`.
///
/// # Errors
///
/// Returns `InputError::NonFiniteWeight` or `InputError::WeightOutOfRange`.
pub fn validate_weight(weight: f64, max_weight: f64) -> Result<f64, InputError> {
    if !weight.is_finite() {
        return Err(InputError::NonFiniteWeight);
    }
    if !(0.0..=max_weight).contains(&weight) {
        return Err(InputError::WeightOutOfRange {
            weight,
            max: max_weight,
        });
    }
    Ok(weight)
}

/// Response body for a registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub progress: SetRecord,
    pub message: String,
    pub suggested_weight: Option<f64>,
    pub is_completed: bool,
}

impl From<RegistrationResult> for RegistrationResponse {
    fn from(result: RegistrationResult) -> Self {
        Self {
            progress: result.record,
            message: result.message,
            suggested_weight: result.suggested_weight,
            is_completed: result.is_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_parses_with_and_without_weight() {
        let full: SetReport = serde_json::from_str(r#"{"weight": 42.5, "reps": 8}"#).unwrap();
        assert_eq!(full, SetReport::new(42.5, 8));

        let bare: SetReport = serde_json::from_str(r#"{"reps": 8}"#).unwrap();
        assert_eq!(bare, SetReport::reps_only(8));

        let empty: SetReport = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.validate(500.0), Err(InputError::MissingReps));
    }

    #[test]
    fn weight_ceiling_is_inclusive() {
        assert_eq!(validate_weight(500.0, 500.0), Ok(500.0));
        assert_eq!(validate_weight(0.0, 500.0), Ok(0.0));
        assert!(matches!(
            validate_weight(500.01, 500.0),
            Err(InputError::WeightOutOfRange { .. })
        ));
        assert!(matches!(
            validate_weight(-0.5, 500.0),
            Err(InputError::WeightOutOfRange { .. })
        ));
        assert_eq!(
            validate_weight(f64::NAN, 500.0),
            Err(InputError::NonFiniteWeight)
        );
    }

    #[test]
    fn reps_must_be_positive() {
        assert_eq!(
            SetReport::new(10.0, 0).validate(500.0),
            Err(InputError::InvalidReps(0))
        );
        assert_eq!(
            SetReport::new(10.0, -3).validate(500.0),
            Err(InputError::InvalidReps(-3))
        );
        let ok = SetReport::reps_only(12).validate(500.0).unwrap();
        assert_eq!(ok.reps, 12);
        assert_eq!(ok.weight, None);
    }
}
