//! # Error Types
//!
//! Crate-level error taxonomy. Subsystems keep their own `thiserror` enums
//! ([`BusError`], [`DataPlaneError`]) and convert into [`LineflowError`] at the
//! orchestration boundary.

use crate::data_plane::DataPlaneError;
use crate::messaging::BusError;
use crate::worker::Role;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LineflowError {
    /// A shared resource (control bus, data-plane channel) could not be created
    /// or is no longer available. Fatal at startup.
    #[error("Resource unavailable: {resource}: {message}")]
    ResourceUnavailable { resource: String, message: String },

    /// A send was attempted to a role whose address has not been announced yet.
    #[error("Stale destination: address of {role} is unresolved")]
    StaleDestination { role: Role },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    DataPlane(#[from] DataPlaneError),

    #[error("Worker {role} failed to join: {message}")]
    WorkerJoin { role: Role, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LineflowError {
    pub fn resource_unavailable(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResourceUnavailable {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether the error should abort startup rather than be retried in-loop
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ResourceUnavailable { .. } | Self::Configuration(_) | Self::Bus(BusError::Closed)
        )
    }
}

impl From<config::ConfigError> for LineflowError {
    fn from(err: config::ConfigError) -> Self {
        LineflowError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LineflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LineflowError::resource_unavailable("control_bus", "bus was destroyed");
        assert_eq!(
            err.to_string(),
            "Resource unavailable: control_bus: bus was destroyed"
        );

        let err = LineflowError::StaleDestination {
            role: Role::Transform,
        };
        assert!(err.to_string().contains("transform"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(LineflowError::resource_unavailable("bus", "gone").is_fatal());
        assert!(LineflowError::configuration("bad").is_fatal());
        assert!(LineflowError::Bus(BusError::Closed).is_fatal());
        assert!(!LineflowError::DataPlane(DataPlaneError::Closed).is_fatal());
        assert!(!LineflowError::StaleDestination { role: Role::Sink }.is_fatal());
    }
}
