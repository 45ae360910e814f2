use serde::{Deserialize, Serialize};

use crate::domain::field::FieldKind;

/// Progress of a single field's collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldState {
    Prompting { attempt: u32 },
    Done,
    Terminated,
}

impl FieldState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Terminated)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldEvent {
    InputAccepted,
    InputRejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: FieldState,
    pub to: FieldState,
    pub event: FieldEvent,
}

/// Position of a call in the booking script.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStage {
    Greeting,
    Month,
    Day,
    Meridiem,
    Hour,
    Minute,
    Readback,
    Confirmation,
    Notifying,
    Completed,
    Terminated,
}

impl CallStage {
    pub fn field(&self) -> Option<FieldKind> {
        match self {
            Self::Month => Some(FieldKind::Month),
            Self::Day => Some(FieldKind::Day),
            Self::Meridiem => Some(FieldKind::Meridiem),
            Self::Hour => Some(FieldKind::Hour),
            Self::Minute => Some(FieldKind::Minute),
            Self::Confirmation => Some(FieldKind::Confirmation),
            Self::Greeting
            | Self::Readback
            | Self::Notifying
            | Self::Completed
            | Self::Terminated => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Terminated)
    }
}
