use crate::domain::field::FieldKind;
use crate::domain::reservation::ReservationDraft;
use crate::errors::{DomainError, TelephonyError};
use crate::telephony::Telephony;

pub const WELCOME: &str = "welcome";
pub const YOU_SELECTED: &str = "you_selected";
pub const CONFIRM_RESERVATION: &str = "confirm_reservation";
pub const YOUR_RESERVATION: &str = "your_reservation";
pub const RESERVATION_CONFIRMED: &str = "reservation_confirmed";
pub const RESERVATION_CANCELED: &str = "reservation_canceled";
pub const THANK_YOU: &str = "thank_you";

/// Resolves script cue names to channel asset paths under one prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetCatalog {
    prefix: String,
}

impl AssetCatalog {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into().trim_end_matches('/').to_owned() }
    }

    pub fn resolve(&self, cue: &str) -> String {
        if self.prefix.is_empty() {
            cue.to_owned()
        } else {
            format!("{}/{cue}", self.prefix)
        }
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::new("hospital_reservation")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Play(&'static str),
    Number(u32),
}

/// "You selected ..." played right after a field is accepted.
pub fn echo_cues(field: FieldKind, draft: &ReservationDraft) -> Vec<Cue> {
    let value = match field {
        FieldKind::Month => draft.month(),
        FieldKind::Day => draft.day(),
        FieldKind::Hour => draft.hour(),
        FieldKind::Minute => draft.minute(),
        FieldKind::Meridiem => {
            return draft
                .meridiem()
                .map(|meridiem| vec![Cue::Play(YOU_SELECTED), Cue::Play(meridiem.asset())])
                .unwrap_or_default();
        }
        FieldKind::Confirmation => None,
    };

    match (value, field.unit_asset()) {
        (Some(value), Some(unit)) => {
            vec![Cue::Play(YOU_SELECTED), Cue::Number(value), Cue::Play(unit)]
        }
        _ => Vec::new(),
    }
}

/// Full reservation read back before the confirmation prompt.
pub fn readback_cues(draft: &ReservationDraft) -> Result<Vec<Cue>, DomainError> {
    let incomplete = || DomainError::IncompleteReservation { missing: draft.next_field() };
    let month = draft.month().ok_or_else(incomplete)?;
    let day = draft.day().ok_or_else(incomplete)?;
    let meridiem = draft.meridiem().ok_or_else(incomplete)?;
    let hour = draft.hour().ok_or_else(incomplete)?;
    let minute = draft.minute().ok_or_else(incomplete)?;

    Ok(vec![
        Cue::Play(CONFIRM_RESERVATION),
        Cue::Play(YOUR_RESERVATION),
        Cue::Number(month),
        Cue::Play("month"),
        Cue::Number(day),
        Cue::Play("day"),
        Cue::Play(meridiem.asset()),
        Cue::Number(hour),
        Cue::Play("hour"),
        Cue::Number(minute),
        Cue::Play("minute"),
    ])
}

pub async fn play_cues<T>(
    telephony: &mut T,
    catalog: &AssetCatalog,
    cues: &[Cue],
) -> Result<(), TelephonyError>
where
    T: Telephony + ?Sized,
{
    for cue in cues {
        match cue {
            Cue::Play(name) => telephony.play(&catalog.resolve(name)).await?,
            Cue::Number(value) => telephony.say_number(*value).await?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::domain::field::FieldKind;
    use crate::domain::reservation::ReservationDraft;
    use crate::errors::DomainError;
    use crate::prompts::{
        echo_cues, play_cues, readback_cues, AssetCatalog, Cue, CONFIRM_RESERVATION,
        YOUR_RESERVATION, YOU_SELECTED,
    };
    use crate::telephony::{ScriptedTelephony, TelephonyAction};

    fn draft_through(inputs: &[(FieldKind, &str)]) -> ReservationDraft {
        let mut draft = ReservationDraft::new("caller");
        for (field, input) in inputs {
            draft.record(*field, input).expect("valid field");
        }
        draft
    }

    #[test]
    fn catalog_prefixes_cue_names() {
        assert_eq!(AssetCatalog::default().resolve("welcome"), "hospital_reservation/welcome");
        assert_eq!(AssetCatalog::new("ivr/").resolve("am"), "ivr/am");
        assert_eq!(AssetCatalog::new("").resolve("am"), "am");
    }

    #[test]
    fn numeric_fields_echo_value_and_unit() {
        let draft = draft_through(&[(FieldKind::Month, "5")]);
        assert_eq!(
            echo_cues(FieldKind::Month, &draft),
            vec![Cue::Play(YOU_SELECTED), Cue::Number(5), Cue::Play("month")]
        );
    }

    #[test]
    fn meridiem_echo_selects_am_or_pm_asset() {
        let draft = draft_through(&[
            (FieldKind::Month, "5"),
            (FieldKind::Day, "15"),
            (FieldKind::Meridiem, "2"),
        ]);
        assert_eq!(
            echo_cues(FieldKind::Meridiem, &draft),
            vec![Cue::Play(YOU_SELECTED), Cue::Play("pm")]
        );
        assert!(echo_cues(FieldKind::Confirmation, &draft).is_empty());
    }

    #[test]
    fn readback_follows_month_day_meridiem_hour_minute() {
        let draft = draft_through(&[
            (FieldKind::Month, "5"),
            (FieldKind::Day, "15"),
            (FieldKind::Meridiem, "1"),
            (FieldKind::Hour, "10"),
            (FieldKind::Minute, "30"),
        ]);

        assert_eq!(
            readback_cues(&draft).expect("complete draft"),
            vec![
                Cue::Play(CONFIRM_RESERVATION),
                Cue::Play(YOUR_RESERVATION),
                Cue::Number(5),
                Cue::Play("month"),
                Cue::Number(15),
                Cue::Play("day"),
                Cue::Play("am"),
                Cue::Number(10),
                Cue::Play("hour"),
                Cue::Number(30),
                Cue::Play("minute"),
            ]
        );
    }

    #[test]
    fn readback_requires_all_five_fields() {
        let draft = draft_through(&[(FieldKind::Month, "5")]);
        assert_eq!(
            readback_cues(&draft),
            Err(DomainError::IncompleteReservation { missing: FieldKind::Day })
        );
    }

    #[tokio::test]
    async fn cues_are_played_through_the_channel() {
        let mut channel = ScriptedTelephony::new("caller", Vec::<String>::new());
        play_cues(&mut channel, &AssetCatalog::default(), &[Cue::Play("day"), Cue::Number(7)])
            .await
            .expect("playback");

        assert_eq!(
            channel.actions(),
            &[
                TelephonyAction::Play("hospital_reservation/day".to_owned()),
                TelephonyAction::SayNumber(7),
            ]
        );
    }
}
