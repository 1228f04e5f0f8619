use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::matching::ParamTag;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TaskValidationError {
    #[error("task has no focus products; add at least one product code to `focus_products`")]
    MissingFocusProducts,
    #[error("task has no enabled parameters; enable at least one of param1..param7")]
    NoEnabledParameters,
    #[error("date range starts on {from} after it ends on {to}")]
    InvertedDateRange { from: NaiveDate, to: NaiveDate },
    #[error("{param}.{field} has invalid value {value}")]
    InvalidThreshold { param: ParamTag, field: &'static str, value: f64 },
    #[error("param5 is enabled but no segments are selected")]
    EmptySegmentSet,
    #[error("param7 is enabled but `x_products` is empty")]
    EmptySubstituteSet,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("invalid task definition: {0}")]
    InvalidTask(#[from] TaskValidationError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("input failure: {0}")]
    Input(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. } | Self::Internal { message, .. } => message,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Input(message) => {
                Self::BadRequest { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError, TaskValidationError};

    #[test]
    fn invalid_task_maps_to_bad_request_interface_error() {
        let interface =
            ApplicationError::from(DomainError::from(TaskValidationError::MissingFocusProducts))
                .into_interface("task-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "task-1"
        ));
        assert!(interface.message().contains("focus_products"));
    }

    #[test]
    fn bad_request_has_user_safe_message() {
        let interface = ApplicationError::Input("ledger.json is not valid JSON".to_owned())
            .into_interface("req-2");

        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("engine.snapshot_chunk_size is zero".to_owned())
                .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }

    #[test]
    fn validation_errors_are_descriptive() {
        let error = TaskValidationError::InvalidThreshold {
            param: crate::domain::matching::ParamTag::Param6,
            field: "similarity",
            value: 140.0,
        };

        assert_eq!(error.to_string(), "param6.similarity has invalid value 140");
    }
}
