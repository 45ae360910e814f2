use std::collections::VecDeque;

use async_trait::async_trait;

use crate::errors::TelephonyError;

pub const UNKNOWN_CALLER: &str = "Unknown";

/// Capability set of the telephony channel a call runs on. Every operation
/// blocks the call until the channel reports back.
#[async_trait]
pub trait Telephony: Send {
    /// Caller line identifier, [`UNKNOWN_CALLER`] when the channel has none.
    fn caller_id(&self) -> &str;

    async fn answer(&mut self) -> Result<(), TelephonyError>;

    async fn hangup(&mut self) -> Result<(), TelephonyError>;

    async fn play(&mut self, asset: &str) -> Result<(), TelephonyError>;

    async fn say_number(&mut self, value: u32) -> Result<(), TelephonyError>;

    async fn pause(&mut self, secs: u64) -> Result<(), TelephonyError>;

    /// Plays `tone` and waits up to `timeout_ms` for at most `max_digits`
    /// keypresses. Timeout or no input yields an empty string.
    async fn collect_digits(
        &mut self,
        tone: &str,
        timeout_ms: u64,
        max_digits: u8,
    ) -> Result<String, TelephonyError>;

    /// Operator-facing diagnostic line on the channel's console.
    async fn verbose(&mut self, message: &str) -> Result<(), TelephonyError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TelephonyAction {
    Answer,
    Hangup,
    Play(String),
    SayNumber(u32),
    Pause(u64),
    CollectDigits { tone: String, timeout_ms: u64, max_digits: u8 },
}

impl std::fmt::Display for TelephonyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Answer => f.write_str("answer"),
            Self::Hangup => f.write_str("hangup"),
            Self::Play(asset) => write!(f, "play {asset}"),
            Self::SayNumber(value) => write!(f, "say {value}"),
            Self::Pause(secs) => write!(f, "pause {secs}s"),
            Self::CollectDigits { tone, timeout_ms, max_digits } => {
                write!(f, "collect {max_digits} digit(s) after {tone}, {timeout_ms}ms")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptedInput {
    Digits(String),
    /// Caller hung up; this and every later operation fails.
    Hangup,
}

/// In-memory channel fed from a fixed keypad script. Runs out of script as
/// timeouts (empty input).
#[derive(Clone, Debug)]
pub struct ScriptedTelephony {
    caller_id: String,
    inputs: VecDeque<ScriptedInput>,
    actions: Vec<TelephonyAction>,
    console: Vec<String>,
    closed: bool,
}

impl ScriptedTelephony {
    pub fn new<I, S>(caller_id: impl Into<String>, digits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            caller_id: caller_id.into(),
            inputs: digits.into_iter().map(|value| ScriptedInput::Digits(value.into())).collect(),
            actions: Vec::new(),
            console: Vec::new(),
            closed: false,
        }
    }

    pub fn with_input(mut self, input: ScriptedInput) -> Self {
        self.inputs.push_back(input);
        self
    }

    pub fn actions(&self) -> &[TelephonyAction] {
        &self.actions
    }

    pub fn console(&self) -> &[String] {
        &self.console
    }

    pub fn remaining_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn count(&self, predicate: impl Fn(&TelephonyAction) -> bool) -> usize {
        self.actions.iter().filter(|action| predicate(action)).count()
    }

    fn record(&mut self, action: TelephonyAction) -> Result<(), TelephonyError> {
        if self.closed {
            return Err(TelephonyError::ChannelClosed);
        }
        self.actions.push(action);
        Ok(())
    }
}

#[async_trait]
impl Telephony for ScriptedTelephony {
    fn caller_id(&self) -> &str {
        &self.caller_id
    }

    async fn answer(&mut self) -> Result<(), TelephonyError> {
        self.record(TelephonyAction::Answer)
    }

    async fn hangup(&mut self) -> Result<(), TelephonyError> {
        self.record(TelephonyAction::Hangup)?;
        self.closed = true;
        Ok(())
    }

    async fn play(&mut self, asset: &str) -> Result<(), TelephonyError> {
        self.record(TelephonyAction::Play(asset.to_owned()))
    }

    async fn say_number(&mut self, value: u32) -> Result<(), TelephonyError> {
        self.record(TelephonyAction::SayNumber(value))
    }

    async fn pause(&mut self, secs: u64) -> Result<(), TelephonyError> {
        self.record(TelephonyAction::Pause(secs))
    }

    async fn collect_digits(
        &mut self,
        tone: &str,
        timeout_ms: u64,
        max_digits: u8,
    ) -> Result<String, TelephonyError> {
        self.record(TelephonyAction::CollectDigits {
            tone: tone.to_owned(),
            timeout_ms,
            max_digits,
        })?;

        match self.inputs.pop_front() {
            Some(ScriptedInput::Digits(digits)) => {
                Ok(digits.chars().take(usize::from(max_digits)).collect())
            }
            Some(ScriptedInput::Hangup) => {
                self.closed = true;
                Err(TelephonyError::ChannelClosed)
            }
            None => Ok(String::new()),
        }
    }

    async fn verbose(&mut self, message: &str) -> Result<(), TelephonyError> {
        if self.closed {
            return Err(TelephonyError::ChannelClosed);
        }
        self.console.push(message.to_owned());
        Ok(())
    }
}
