//! # Control Bus Error Types
//!
//! Structured errors for control-plane delivery.

use thiserror::Error;

use super::bus::WorkerAddress;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("No mailbox registered for destination {address}")]
    UnknownDestination { address: WorkerAddress },

    #[error("Control bus is closed")]
    Closed,
}

impl BusError {
    pub fn unknown_destination(address: WorkerAddress) -> Self {
        Self::UnknownDestination { address }
    }
}

pub type BusResult<T> = Result<T, BusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let address = WorkerAddress::new();
        let err = BusError::unknown_destination(address);
        let display = err.to_string();
        assert!(display.contains("No mailbox registered"));
        assert!(display.contains(&address.to_string()));

        assert_eq!(BusError::Closed.to_string(), "Control bus is closed");
    }
}
