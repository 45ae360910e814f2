pub mod call;
pub mod collect;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod notify;
pub mod prompts;
pub mod telephony;

pub use call::{CallOutcome, ReservationCall};
pub use collect::{FieldPrompt, InputCollector};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::field::FieldKind;
pub use domain::notification::{CallbackNotification, CallbackStatus, SummaryNotification};
pub use domain::reservation::{Decision, Meridiem, ReservationDraft, ReservationRequest};
pub use errors::{CallError, CollectError, DomainError, NotifyError, TelephonyError};
pub use flows::{CallFlow, CallStage, FieldFlow};
pub use notify::{
    dispatch_notifications, Clock, Delivery, DispatchReport, NotificationSink, NotificationStatus,
    RecordingNotifier, SystemClock,
};
pub use prompts::AssetCatalog;
pub use telephony::{ScriptedTelephony, Telephony, UNKNOWN_CALLER};
