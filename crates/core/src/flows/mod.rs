pub mod engine;
pub mod states;

pub use engine::{CallFlow, FieldFlow, FlowTransitionError};
pub use states::{CallStage, FieldEvent, FieldState, TransitionOutcome};
