//! Error types for frame retrieval and session management.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::data::DecodeError;
use crate::fetch::FrameKey;

/// Errors produced while fetching a single frame.
///
/// Whatever the cause, a channel controller treats every variant the same
/// way: the frame stays unloaded and may be requested again later.
#[derive(Error, Debug)]
pub enum FetchError {
    /// I/O error while reading frame data
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame bytes could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// No data exists for the requested frame
    #[error("Frame unavailable: {key}")]
    Unavailable {
        /// The frame that was requested
        key: FrameKey,
    },

    /// Frame index is outside the channel's frame count
    #[error("Frame {frame} out of range (channel has {total} frames)")]
    FrameOutOfRange {
        /// Requested frame index
        frame: usize,
        /// Number of frames in the channel
        total: usize,
    },

    /// Channel index is outside the session's channel count
    #[error("Channel {channel} out of range (session has {total} channels)")]
    ChannelOutOfRange {
        /// Requested channel index
        channel: usize,
        /// Number of channels in the session
        total: usize,
    },

    /// The frame source panicked while fetching
    #[error("Frame source panicked while fetching {key}: {message}")]
    SourcePanicked {
        /// The frame that was requested
        key: FrameKey,
        /// Panic payload, if it was a string
        message: String,
    },

    /// The background fetch thread is gone
    #[error("Fetch worker disconnected")]
    WorkerDisconnected,
}

impl FetchError {
    /// Create an unavailable-frame error.
    pub fn unavailable(key: &FrameKey) -> Self {
        Self::Unavailable { key: key.clone() }
    }
}

/// Errors that can occur while opening or driving a session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// I/O error while reading the project
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest JSON could not be parsed
    #[error("Invalid project manifest: {0}")]
    Json(#[from] serde_json::Error),

    /// Project manifest missing from the project directory
    #[error("Project manifest not found: {path:?}")]
    ManifestNotFound {
        /// Where the manifest was expected
        path: PathBuf,
    },

    /// Project has no channels or no frames
    #[error("Project '{project_id}' has {channels} channels and {frames} frames")]
    EmptyProject {
        /// Project identifier
        project_id: String,
        /// Number of channels in the manifest
        channels: usize,
        /// Number of frames in the manifest
        frames: usize,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Fetch worker could not be started or addressed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}
