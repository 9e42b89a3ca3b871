use std::fmt::Display;

/// Errors surfaced by trip planning.
///
/// Planning is atomic: any of these aborts the whole run and no partial
/// schedule is returned.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("invalid {field} `{value}`: {reason}")]
    InvalidInput {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error(
        "70-hour cycle exceeded: {used_hours:.2}h already used, {required_hours:.2}h more on-duty time required, limit is {limit_hours:.2}h"
    )]
    CycleExceeded {
        used_hours: f64,
        required_hours: f64,
        limit_hours: f64,
    },
    #[error("unable to geocode {address:?}")]
    Geocoding {
        address: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("unable to compute route")]
    Routing(#[source] anyhow::Error),
}

impl PlanError {
    pub fn invalid(field: &'static str, value: impl Display, reason: &'static str) -> Self {
        Self::InvalidInput {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

pub type PlanResult<T> = Result<T, PlanError>;

/// Rejects negative, NaN and infinite values.
pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> PlanResult<f64> {
    if !value.is_finite() {
        return Err(PlanError::invalid(field, value, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(PlanError::invalid(field, value, "must not be negative"));
    }
    Ok(value)
}

#[test]
fn test_ensure_non_negative() {
    assert!(ensure_non_negative("miles", 0.0).is_ok());
    assert!(ensure_non_negative("miles", 12.5).is_ok());
    assert!(matches!(
        ensure_non_negative("miles", -1.0),
        Err(PlanError::InvalidInput { field: "miles", .. })
    ));
    assert!(ensure_non_negative("miles", f64::NAN).is_err());
    assert!(ensure_non_negative("miles", f64::INFINITY).is_err());
}
