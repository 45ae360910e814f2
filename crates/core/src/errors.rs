use thiserror::Error;

use crate::domain::field::FieldKind;
use crate::flows::FlowTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("field {actual} written out of order (expected {expected})")]
    OutOfOrderField { expected: FieldKind, actual: FieldKind },
    #[error("invalid {field} input `{input}`")]
    InvalidFieldValue { field: FieldKind, input: String },
    #[error("reservation is incomplete, {missing} has not been collected")]
    IncompleteReservation { missing: FieldKind },
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
}

/// Failures reported by the telephony collaborator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TelephonyError {
    #[error("telephony i/o failure: {0}")]
    Io(String),
    #[error("telephony protocol failure: {0}")]
    Protocol(String),
    #[error("call channel is closed")]
    ChannelClosed,
}

impl From<std::io::Error> for TelephonyError {
    fn from(value: std::io::Error) -> Self {
        match value.kind() {
            std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::UnexpectedEof => {
                Self::ChannelClosed
            }
            _ => Self::Io(value.to_string()),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollectError {
    #[error("{field} input rejected {attempts} times, call terminated")]
    RetryExhausted { field: FieldKind, attempts: u32 },
    #[error(transparent)]
    Telephony(#[from] TelephonyError),
    #[error(transparent)]
    Flow(#[from] FlowTransitionError),
}

/// Delivery failure of an outbound webhook. Logged by the call session and
/// never surfaced to the caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("webhook transport failure: {0}")]
    Transport(String),
    #[error("webhook responded with status {status}")]
    Status { status: u16 },
    #[error("webhook payload serialization failed: {0}")]
    Serialization(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CallError {
    #[error(transparent)]
    Telephony(#[from] TelephonyError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<FlowTransitionError> for CallError {
    fn from(value: FlowTransitionError) -> Self {
        Self::Domain(DomainError::FlowTransition(value))
    }
}
