pub mod action_registry;
pub mod submission_serializer;
pub mod submit_machine;

pub use action_registry::{parse_payload, ActionHandler, ActionRegistry, DispatchReport};
pub use submission_serializer::{ActionSink, SubmissionSerializer};
pub use submit_machine::{SettleOutcome, SubmitMachine, SubmitPhase, SubmitTimings, Transition};
