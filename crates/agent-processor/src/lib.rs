//! Wires the pure state-machine transitions and the chain-I/O crates
//! (`chain-client`, `action-executor`, `event-sync`) into the single worker
//! that owns the agent's view of every tracked request and claim.

pub mod context;
pub mod policy;
pub mod processor;
pub mod queue;
pub mod worker;

pub use context::Context;
pub use processor::EventProcessor;
pub use queue::EventQueue;
pub use worker::ProcessorHandle;
