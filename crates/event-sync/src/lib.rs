//! Confirmed event ingestion: a windowed, cursor-based [`EventFetcher`]
//! driven by a background [`EventMonitor`].

pub mod fetcher;
pub mod monitor;
pub mod source;

pub use fetcher::EventFetcher;
pub use monitor::EventMonitor;
pub use source::{EventSource, FillManagerSource, RequestManagerSource};
