//! Shared data model for the bridge liquidity-provider agent: request and
//! claim entities, the events observed on-chain, block references used for
//! time predicates, and the error taxonomy every other crate in this
//! workspace speaks.

pub mod block;
pub mod claim;
pub mod error;
pub mod events;
pub mod fees;
pub mod ids;
pub mod request;

pub use block::BlockReference;
pub use claim::{Claim, ClaimState};
pub use error::{AgentError, AgentResult};
pub use events::Event;
pub use ids::{ChainId, ClaimId, FillId, RequestId};
pub use request::{Request, RequestState};
