use serde::{Deserialize, Serialize};

use crate::domain::reservation::Meridiem;

pub const ALLOWED_MINUTES: [u32; 6] = [0, 10, 20, 30, 40, 50];

/// One of the six values collected from the caller, in collection order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Month,
    Day,
    Meridiem,
    Hour,
    Minute,
    Confirmation,
}

impl FieldKind {
    pub const ORDER: [FieldKind; 6] = [
        FieldKind::Month,
        FieldKind::Day,
        FieldKind::Meridiem,
        FieldKind::Hour,
        FieldKind::Minute,
        FieldKind::Confirmation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Day => "day",
            Self::Meridiem => "meridiem",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Confirmation => "confirmation",
        }
    }

    pub fn next(&self) -> Option<FieldKind> {
        let position = Self::ORDER.iter().position(|kind| kind == self)?;
        Self::ORDER.get(position + 1).copied()
    }

    pub fn max_digits(&self) -> u8 {
        match self {
            Self::Meridiem | Self::Confirmation => 1,
            Self::Month | Self::Day | Self::Hour | Self::Minute => 2,
        }
    }

    /// Prompt played at the start of every attempt.
    pub fn prompt_asset(&self) -> &'static str {
        match self {
            Self::Month => "select_month",
            Self::Day => "select_day",
            Self::Meridiem => "select_ampm",
            Self::Hour => "select_hour",
            Self::Minute => "select_minute",
            Self::Confirmation => "press_confirm",
        }
    }

    /// Cue played after a rejected attempt. Confirmation shares the am/pm cue
    /// since both accept only `1` or `2`.
    pub fn invalid_asset(&self) -> &'static str {
        match self {
            Self::Month => "invalid_month",
            Self::Day => "invalid_day",
            Self::Meridiem | Self::Confirmation => "invalid_ampm",
            Self::Hour => "invalid_hour",
            Self::Minute => "invalid_minute",
        }
    }

    /// Unit cue spoken after a numeric value during echo and readback.
    pub fn unit_asset(&self) -> Option<&'static str> {
        match self {
            Self::Month => Some("month"),
            Self::Day => Some("day"),
            Self::Hour => Some("hour"),
            Self::Minute => Some("minute"),
            Self::Meridiem | Self::Confirmation => None,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a non-empty run of ASCII digits. Signs, whitespace and values
/// beyond `u32` are rejected.
pub fn parse_digits(input: &str) -> Option<u32> {
    if input.is_empty() || !input.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    input.parse::<u32>().ok()
}

pub fn validate_month(input: &str) -> bool {
    parse_digits(input).is_some_and(|month| (1..=12).contains(&month))
}

pub fn validate_day(input: &str) -> bool {
    parse_digits(input).is_some_and(|day| (1..=31).contains(&day))
}

pub fn validate_meridiem(input: &str) -> bool {
    input == "1" || input == "2"
}

pub fn validate_hour(input: &str, meridiem: Meridiem) -> bool {
    parse_digits(input).is_some_and(|hour| meridiem.hour_range().contains(&hour))
}

pub fn validate_minute(input: &str) -> bool {
    parse_digits(input).is_some_and(|minute| ALLOWED_MINUTES.contains(&minute))
}

pub fn validate_confirmation(input: &str) -> bool {
    input == "1" || input == "2"
}

/// Validator for `kind`. The hour rule needs the meridiem collected before it;
/// without one it rejects everything.
pub fn validate_field(kind: FieldKind, input: &str, meridiem: Option<Meridiem>) -> bool {
    match kind {
        FieldKind::Month => validate_month(input),
        FieldKind::Day => validate_day(input),
        FieldKind::Meridiem => validate_meridiem(input),
        FieldKind::Hour => meridiem.is_some_and(|meridiem| validate_hour(input, meridiem)),
        FieldKind::Minute => validate_minute(input),
        FieldKind::Confirmation => validate_confirmation(input),
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::field::{
        parse_digits, validate_confirmation, validate_day, validate_field, validate_hour,
        validate_meridiem, validate_minute, validate_month, FieldKind,
    };
    use crate::domain::reservation::Meridiem;

    #[test]
    fn month_accepts_exactly_one_through_twelve() {
        for value in 0..=100u32 {
            let input = value.to_string();
            assert_eq!(validate_month(&input), (1..=12).contains(&value), "month {input}");
        }
        assert!(validate_month("05"));
        assert!(!validate_month(""));
        assert!(!validate_month("1a"));
        assert!(!validate_month("+5"));
        assert!(!validate_month(" 5"));
    }

    #[test]
    fn day_has_no_month_length_cross_check() {
        assert!(validate_day("31"));
        assert!(validate_day("1"));
        assert!(!validate_day("0"));
        assert!(!validate_day("32"));
        assert!(!validate_day("*"));
    }

    #[test]
    fn meridiem_and_confirmation_accept_only_one_or_two() {
        for input in ["1", "2"] {
            assert!(validate_meridiem(input));
            assert!(validate_confirmation(input));
        }
        for input in ["", "0", "3", "01", "12", "#"] {
            assert!(!validate_meridiem(input), "meridiem {input:?}");
            assert!(!validate_confirmation(input), "confirmation {input:?}");
        }
    }

    #[test]
    fn hour_range_depends_on_meridiem() {
        for value in 0..=24u32 {
            let input = value.to_string();
            assert_eq!(validate_hour(&input, Meridiem::Am), (9..=12).contains(&value));
            assert_eq!(validate_hour(&input, Meridiem::Pm), (1..=6).contains(&value));
        }
    }

    #[test]
    fn hour_twelve_is_morning_only_and_seven_is_never_valid() {
        assert!(validate_hour("12", Meridiem::Am));
        assert!(!validate_hour("12", Meridiem::Pm));
        assert!(!validate_hour("7", Meridiem::Am));
        assert!(!validate_hour("7", Meridiem::Pm));
    }

    #[test]
    fn minute_accepts_ten_minute_slots() {
        for value in 0..=99u32 {
            let input = value.to_string();
            assert_eq!(validate_minute(&input), value % 10 == 0 && value <= 50, "minute {input}");
        }
        assert!(validate_minute("00"));
        assert!(!validate_minute(""));
    }

    #[test]
    fn overflowing_digit_strings_are_rejected() {
        assert_eq!(parse_digits("99999999999"), None);
        assert!(!validate_month("99999999999"));
    }

    #[test]
    fn hour_without_meridiem_context_is_rejected() {
        assert!(!validate_field(FieldKind::Hour, "10", None));
        assert!(validate_field(FieldKind::Hour, "10", Some(Meridiem::Am)));
    }

    #[test]
    fn field_order_walks_all_six_fields() {
        let mut walked = vec![FieldKind::Month];
        while let Some(next) = walked.last().and_then(FieldKind::next) {
            walked.push(next);
        }
        assert_eq!(walked, FieldKind::ORDER.to_vec());
        assert_eq!(FieldKind::Confirmation.invalid_asset(), "invalid_ampm");
        assert_eq!(FieldKind::Meridiem.max_digits(), 1);
    }
}
