//! Pure transition functions for [`bridge_types::Request`] and
//! [`bridge_types::Claim`]. No I/O, no tracker ownership — just the rules
//! for moving an entity from one state to the next given an event, so the
//! event-processing loop in `agent-processor` can stay a thin driver around
//! logic that's fully unit-testable on its own.

pub mod claim_sm;
pub mod outcome;
pub mod request_sm;

pub use outcome::ApplyOutcome;
