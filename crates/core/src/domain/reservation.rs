use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::domain::field::{parse_digits, validate_field, FieldKind};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    /// Maps the keypad choice: `1` morning, `2` afternoon.
    pub fn from_digits(input: &str) -> Option<Self> {
        match input {
            "1" => Some(Self::Am),
            "2" => Some(Self::Pm),
            _ => None,
        }
    }

    /// Bookable clock hours for this half of the day.
    pub fn hour_range(&self) -> RangeInclusive<u32> {
        match self {
            Self::Am => 9..=12,
            Self::Pm => 1..=6,
        }
    }

    pub fn asset(&self) -> &'static str {
        match self {
            Self::Am => "am",
            Self::Pm => "pm",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::Pm => "PM",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Confirm,
    Cancel,
}

impl Decision {
    pub fn from_digits(input: &str) -> Option<Self> {
        match input {
            "1" => Some(Self::Confirm),
            "2" => Some(Self::Cancel),
            _ => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirm)
    }
}

/// Appointment request as it is being collected. Fields are written strictly
/// in [`FieldKind::ORDER`] and each write is validated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReservationDraft {
    caller_id: String,
    month: Option<u32>,
    day: Option<u32>,
    meridiem: Option<Meridiem>,
    hour: Option<u32>,
    minute: Option<u32>,
}

impl ReservationDraft {
    pub fn new(caller_id: impl Into<String>) -> Self {
        Self { caller_id: caller_id.into(), ..Self::default() }
    }

    pub fn caller_id(&self) -> &str {
        &self.caller_id
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn day(&self) -> Option<u32> {
        self.day
    }

    pub fn meridiem(&self) -> Option<Meridiem> {
        self.meridiem
    }

    pub fn hour(&self) -> Option<u32> {
        self.hour
    }

    pub fn minute(&self) -> Option<u32> {
        self.minute
    }

    /// The field the next write must target. `Confirmation` once the five
    /// appointment fields are present.
    pub fn next_field(&self) -> FieldKind {
        if self.month.is_none() {
            FieldKind::Month
        } else if self.day.is_none() {
            FieldKind::Day
        } else if self.meridiem.is_none() {
            FieldKind::Meridiem
        } else if self.hour.is_none() {
            FieldKind::Hour
        } else if self.minute.is_none() {
            FieldKind::Minute
        } else {
            FieldKind::Confirmation
        }
    }

    /// Writes one appointment field from the caller's raw digits.
    pub fn record(&mut self, field: FieldKind, input: &str) -> Result<(), DomainError> {
        let expected = self.next_field();
        if field != expected {
            return Err(DomainError::OutOfOrderField { expected, actual: field });
        }
        if !validate_field(field, input, self.meridiem) {
            return Err(DomainError::InvalidFieldValue { field, input: input.to_owned() });
        }

        let invalid = || DomainError::InvalidFieldValue { field, input: input.to_owned() };
        match field {
            FieldKind::Month => self.month = Some(parse_digits(input).ok_or_else(invalid)?),
            FieldKind::Day => self.day = Some(parse_digits(input).ok_or_else(invalid)?),
            FieldKind::Meridiem => {
                self.meridiem = Some(Meridiem::from_digits(input).ok_or_else(invalid)?)
            }
            FieldKind::Hour => self.hour = Some(parse_digits(input).ok_or_else(invalid)?),
            FieldKind::Minute => self.minute = Some(parse_digits(input).ok_or_else(invalid)?),
            FieldKind::Confirmation => {
                return Err(DomainError::OutOfOrderField { expected, actual: field })
            }
        }
        Ok(())
    }

    /// Consumes the draft once the caller has answered the confirmation
    /// prompt.
    pub fn finalize(self, decision: Decision) -> Result<ReservationRequest, DomainError> {
        let missing = self.next_field();
        match (self.month, self.day, self.meridiem, self.hour, self.minute) {
            (Some(month), Some(day), Some(meridiem), Some(hour), Some(minute)) => {
                Ok(ReservationRequest {
                    month,
                    day,
                    meridiem,
                    hour,
                    minute,
                    caller_id: self.caller_id,
                    confirmed: decision.is_confirmed(),
                })
            }
            _ => Err(DomainError::IncompleteReservation { missing }),
        }
    }
}

/// A fully collected appointment request. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub month: u32,
    pub day: u32,
    pub meridiem: Meridiem,
    pub hour: u32,
    pub minute: u32,
    pub caller_id: String,
    pub confirmed: bool,
}

impl ReservationRequest {
    /// `5/15 AM 10:30`
    pub fn appointment_label(&self) -> String {
        format!(
            "{}/{} {} {}:{:02}",
            self.month,
            self.day,
            self.meridiem.as_str(),
            self.hour,
            self.minute
        )
    }
}
