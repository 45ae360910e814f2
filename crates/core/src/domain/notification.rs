use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::reservation::ReservationRequest;

pub const CALLBACK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Free-text booking summary, posted as `{"content": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryNotification {
    pub content: String,
}

impl SummaryNotification {
    pub fn for_reservation(reservation: &ReservationRequest) -> Self {
        Self {
            content: format!(
                "New reservation received.\nCaller: {}\nAppointment: {}",
                reservation.caller_id,
                reservation.appointment_label()
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Confirmed,
    Rejected,
}

impl CallbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }
}

/// Outcome record posted after every completed confirmation step, whether
/// the caller confirmed or cancelled. The caller id stands in for a
/// reservation id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackNotification {
    pub reservation_id: String,
    pub status: CallbackStatus,
    pub callback_time: String,
}

impl CallbackNotification {
    pub fn new(caller_id: impl Into<String>, confirmed: bool, at: NaiveDateTime) -> Self {
        Self {
            reservation_id: caller_id.into(),
            status: if confirmed { CallbackStatus::Confirmed } else { CallbackStatus::Rejected },
            callback_time: at.format(CALLBACK_TIME_FORMAT).to_string(),
        }
    }
}
