//! Frame sources: where raw frames come from.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::data::{DecoderRegistry, RawFrame};
use crate::error::FetchError;

/// Identifies one channel of one frame within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameKey {
    /// Project the frame belongs to
    pub project_id: String,
    /// Channel index
    pub channel: usize,
    /// Frame index
    pub frame: usize,
}

impl FrameKey {
    /// Create a new frame key.
    pub fn new(project_id: impl Into<String>, channel: usize, frame: usize) -> Self {
        Self {
            project_id: project_id.into(),
            channel,
            frame,
        }
    }
}

impl fmt::Display for FrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/channel {}/frame {}",
            self.project_id, self.channel, self.frame
        )
    }
}

/// Anything that can produce the raw data of a frame.
///
/// Implementations may block; callers run them on a `FetchThread`.
pub trait FrameSource: Send + Sync {
    /// Fetch the raw frame for `key`.
    fn fetch(&self, key: &FrameKey) -> Result<RawFrame, FetchError>;
}

/// Frames stored on disk as `<root>/<project_id>/<channel>/<frame>.<ext>`.
///
/// Any extension known to the decoder registry is accepted.
pub struct DirectoryFrameSource {
    root: PathBuf,
    registry: DecoderRegistry,
}

impl DirectoryFrameSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            registry: DecoderRegistry::new(),
        }
    }

    /// Root directory containing project folders.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the frames of one channel.
    pub fn channel_dir(&self, project_id: &str, channel: usize) -> PathBuf {
        self.root.join(project_id).join(channel.to_string())
    }

    /// Find the file holding `key`, trying each supported extension.
    fn frame_path(&self, key: &FrameKey) -> Option<PathBuf> {
        let dir = self.channel_dir(&key.project_id, key.channel);
        self.registry
            .supported_extensions()
            .into_iter()
            .map(|ext| dir.join(format!("{}.{}", key.frame, ext)))
            .find(|path| path.is_file())
    }
}

impl FrameSource for DirectoryFrameSource {
    fn fetch(&self, key: &FrameKey) -> Result<RawFrame, FetchError> {
        let path = self
            .frame_path(key)
            .ok_or_else(|| FetchError::unavailable(key))?;

        log::debug!("Reading frame {} from {:?}", key, path);
        let bytes = std::fs::read(&path)?;
        let filename = path.file_name().and_then(|n| n.to_str());
        Ok(self.registry.decode(&bytes, filename)?)
    }
}

/// In-memory frames, with per-key failure injection.
///
/// Useful for demos and for driving sessions deterministically in tests.
#[derive(Default)]
pub struct MemoryFrameSource {
    frames: HashMap<FrameKey, RawFrame>,
    failing: Mutex<HashSet<FrameKey>>,
    fetch_counts: Mutex<HashMap<FrameKey, usize>>,
}

impl MemoryFrameSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame.
    pub fn insert(&mut self, key: FrameKey, frame: RawFrame) {
        self.frames.insert(key, frame);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_frame(mut self, key: FrameKey, frame: RawFrame) -> Self {
        self.insert(key, frame);
        self
    }

    /// Make fetches of `key` fail until [`heal`](Self::heal) is called.
    pub fn fail(&self, key: FrameKey) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
    }

    /// Stop failing fetches of `key`.
    pub fn heal(&self, key: &FrameKey) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Number of fetches issued for `key` so far, failed ones included.
    pub fn fetch_count(&self, key: &FrameKey) -> usize {
        self.fetch_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Total number of fetches issued.
    pub fn total_fetches(&self) -> usize {
        self.fetch_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }
}

impl FrameSource for MemoryFrameSource {
    fn fetch(&self, key: &FrameKey) -> Result<RawFrame, FetchError> {
        *self
            .fetch_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_insert(0) += 1;

        if self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
        {
            return Err(FetchError::unavailable(key));
        }

        self.frames
            .get(key)
            .cloned()
            .ok_or_else(|| FetchError::unavailable(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(values: &[f32]) -> RawFrame {
        RawFrame::new(values.len() as u32, 1, values.to_vec()).unwrap()
    }

    #[test]
    fn test_frame_key_display() {
        let key = FrameKey::new("abc", 1, 7);
        assert_eq!(key.to_string(), "abc/channel 1/frame 7");
    }

    #[test]
    fn test_memory_source_counts_and_failures() {
        let key = FrameKey::new("p", 0, 3);
        let source = MemoryFrameSource::new().with_frame(key.clone(), frame(&[1.0, 2.0]));

        assert_eq!(source.fetch(&key).unwrap().pixels(), &[1.0, 2.0]);

        source.fail(key.clone());
        assert!(matches!(
            source.fetch(&key),
            Err(FetchError::Unavailable { .. })
        ));

        source.heal(&key);
        assert!(source.fetch(&key).is_ok());
        assert_eq!(source.fetch_count(&key), 3);

        let missing = FrameKey::new("p", 0, 4);
        assert!(source.fetch(&missing).is_err());
        assert_eq!(source.total_fetches(), 4);
    }

    #[test]
    fn test_directory_source_reads_any_supported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryFrameSource::new(dir.path());

        let channel_dir = source.channel_dir("proj", 1);
        std::fs::create_dir_all(&channel_dir).unwrap();
        std::fs::write(channel_dir.join("0.json"), "[[0, 5], [10, 15]]").unwrap();

        let img = image::GrayImage::from_raw(1, 2, vec![3, 4]).unwrap();
        img.save(channel_dir.join("1.png")).unwrap();

        let json = source.fetch(&FrameKey::new("proj", 1, 0)).unwrap();
        assert_eq!(json.pixels(), &[0.0, 5.0, 10.0, 15.0]);

        let png = source.fetch(&FrameKey::new("proj", 1, 1)).unwrap();
        assert_eq!(png.pixels(), &[3.0, 4.0]);
    }

    #[test]
    fn test_directory_source_missing_and_corrupt_frames() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryFrameSource::new(dir.path());

        let missing = source.fetch(&FrameKey::new("proj", 0, 0)).unwrap_err();
        assert!(matches!(missing, FetchError::Unavailable { .. }));

        let channel_dir = source.channel_dir("proj", 0);
        std::fs::create_dir_all(&channel_dir).unwrap();
        std::fs::write(channel_dir.join("2.json"), "not json").unwrap();

        let corrupt = source.fetch(&FrameKey::new("proj", 0, 2)).unwrap_err();
        assert!(matches!(corrupt, FetchError::Decode(_)));
    }
}
