//! Frame retrieval.
//!
//! A `FrameSource` answers `(project, channel, frame)` requests with raw
//! frames; a `FetchThread` runs those requests off the caller's thread and
//! posts the outcomes back for polling.

mod source;
mod worker;

pub use source::{DirectoryFrameSource, FrameKey, FrameSource, MemoryFrameSource};
pub use worker::{FetchOutcome, FetchThread};
