//! Per-channel raw data controller.
//!
//! Each imaging channel gets one `ChannelController`. It owns the channel's
//! frame cache and display adjustments, decides what to fetch next, and
//! reports frames that become available to whoever drives it. The controller
//! never performs I/O itself: fetches and notifications come out of
//! [`ChannelController::handle`] as [`ChannelEffect`]s.

mod auto_range;
mod controller;
mod display;


pub use auto_range::{auto_range, percentile_bounds};
pub use controller::{ChannelCommand, ChannelController, ChannelEffect, LoadState};
pub use display::{DisplaySettings, IntensityRange};
