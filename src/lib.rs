//! cellview - multi-channel microscopy frame viewer core
//!
//! Per-channel raw-image controllers with frame caching, nearest-first
//! preloading and percentile auto ranging, coordinated across channels by a
//! `Session` that fetches frames on a background thread.

pub mod channel;
pub mod color_utils;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod fetch;
pub mod layer;
pub mod session;

pub use channel::{ChannelCommand, ChannelController, ChannelEffect, LoadState};
pub use config::ViewerConfig;
pub use data::RawFrame;
pub use error::{FetchError, SessionError};
pub use fetch::{FrameKey, FrameSource};
pub use session::{ProjectManifest, Session, SessionEvent};
