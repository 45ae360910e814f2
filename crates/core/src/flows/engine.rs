use thiserror::Error;

use crate::flows::states::{CallStage, FieldEvent, FieldState, TransitionOutcome};

/// Retry-bounded state machine for one field:
/// `Prompting(n)` moves to `Done` on accepted input, to `Prompting(n + 1)` on
/// rejected input, and to `Terminated` when input is rejected at `max_retry`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldFlow {
    max_retry: u32,
}

impl FieldFlow {
    pub fn new(max_retry: u32) -> Self {
        Self { max_retry: max_retry.max(1) }
    }

    pub fn max_retry(&self) -> u32 {
        self.max_retry
    }

    pub fn initial_state(&self) -> FieldState {
        FieldState::Prompting { attempt: 1 }
    }

    pub fn apply(
        &self,
        current: &FieldState,
        event: &FieldEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        let to = match (current, event) {
            (FieldState::Prompting { .. }, FieldEvent::InputAccepted) => FieldState::Done,
            (FieldState::Prompting { attempt }, FieldEvent::InputRejected) => {
                if *attempt >= self.max_retry {
                    FieldState::Terminated
                } else {
                    FieldState::Prompting { attempt: attempt + 1 }
                }
            }
            (FieldState::Done, _) | (FieldState::Terminated, _) => {
                return Err(FlowTransitionError::InvalidTransition {
                    state: *current,
                    event: *event,
                });
            }
        };

        Ok(TransitionOutcome { from: *current, to, event: *event })
    }
}

impl Default for FieldFlow {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Stage machine of a whole call: the six collection stages in series,
/// bracketed by greeting, readback and notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallFlow;

impl CallFlow {
    pub fn initial_stage(&self) -> CallStage {
        CallStage::Greeting
    }

    pub fn successor(&self, current: CallStage) -> Option<CallStage> {
        use CallStage::{
            Completed, Confirmation, Day, Greeting, Hour, Meridiem, Minute, Month, Notifying,
            Readback, Terminated,
        };

        match current {
            Greeting => Some(Month),
            Month => Some(Day),
            Day => Some(Meridiem),
            Meridiem => Some(Hour),
            Hour => Some(Minute),
            Minute => Some(Readback),
            Readback => Some(Confirmation),
            Confirmation => Some(Notifying),
            Notifying => Some(Completed),
            Completed | Terminated => None,
        }
    }

    pub fn advance(&self, current: CallStage) -> Result<CallStage, FlowTransitionError> {
        self.successor(current).ok_or(FlowTransitionError::InvalidStageTransition {
            from: current,
            to: CallStage::Completed,
        })
    }

    /// Retry exhaustion ends the call; only collection stages can terminate.
    pub fn terminate(&self, current: CallStage) -> Result<CallStage, FlowTransitionError> {
        if current.field().is_some() {
            Ok(CallStage::Terminated)
        } else {
            Err(FlowTransitionError::InvalidStageTransition {
                from: current,
                to: CallStage::Terminated,
            })
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid field transition from {state:?} using event {event:?}")]
    InvalidTransition { state: FieldState, event: FieldEvent },
    #[error("invalid call stage transition from {from:?} to {to:?}")]
    InvalidStageTransition { from: CallStage, to: CallStage },
}

#[cfg(test)]
mod tests {
    use crate::domain::field::FieldKind;
    use crate::flows::engine::{CallFlow, FieldFlow, FlowTransitionError};
    use crate::flows::states::{CallStage, FieldEvent, FieldState};

    #[test]
    fn accepted_input_on_first_attempt_finishes_field() {
        let flow = FieldFlow::default();
        let outcome = flow
            .apply(&flow.initial_state(), &FieldEvent::InputAccepted)
            .expect("prompting -> done");

        assert_eq!(outcome.from, FieldState::Prompting { attempt: 1 });
        assert_eq!(outcome.to, FieldState::Done);
    }

    #[test]
    fn third_rejection_terminates_and_never_reaches_a_fourth_attempt() {
        let flow = FieldFlow::new(3);
        let mut state = flow.initial_state();
        let mut visited = Vec::new();

        while !state.is_terminal() {
            visited.push(state);
            state = flow.apply(&state, &FieldEvent::InputRejected).expect("rejection").to;
        }

        assert_eq!(
            visited,
            vec![
                FieldState::Prompting { attempt: 1 },
                FieldState::Prompting { attempt: 2 },
                FieldState::Prompting { attempt: 3 },
            ]
        );
        assert_eq!(state, FieldState::Terminated);
    }

    #[test]
    fn terminal_field_states_reject_further_events() {
        let flow = FieldFlow::default();
        let error = flow
            .apply(&FieldState::Done, &FieldEvent::InputRejected)
            .expect_err("done is terminal");

        assert!(matches!(
            error,
            FlowTransitionError::InvalidTransition { state: FieldState::Done, .. }
        ));
    }

    #[test]
    fn zero_retry_budget_is_clamped_to_one_attempt() {
        let flow = FieldFlow::new(0);
        assert_eq!(flow.max_retry(), 1);
        let outcome =
            flow.apply(&flow.initial_state(), &FieldEvent::InputRejected).expect("rejection");
        assert_eq!(outcome.to, FieldState::Terminated);
    }

    #[test]
    fn call_stages_visit_fields_in_collection_order() {
        let flow = CallFlow;
        let mut stage = flow.initial_stage();
        let mut fields = Vec::new();

        while let Some(next) = flow.successor(stage) {
            if let Some(field) = next.field() {
                fields.push(field);
            }
            stage = next;
        }

        assert_eq!(stage, CallStage::Completed);
        assert_eq!(fields, FieldKind::ORDER.to_vec());
    }

    #[test]
    fn only_collection_stages_can_terminate() {
        let flow = CallFlow;
        assert_eq!(flow.terminate(CallStage::Hour), Ok(CallStage::Terminated));
        assert!(flow.terminate(CallStage::Notifying).is_err());
        assert!(flow.advance(CallStage::Terminated).is_err());
    }
}
