//! Session coordination across channels.
//!
//! A `Session` owns one `ChannelController` per channel and a `FetchThread`.
//! It carries out the effects the controllers request, feeds fetch results
//! back to the right controller, and tracks which frames are available on
//! every channel. The displayed frame only switches once all channels have
//! it, so channels never show mismatched frames.

use std::collections::{HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelCommand, ChannelController, ChannelEffect};
use crate::constants::{DEFAULT_AUTO_RANGE_CUTOFF, PROJECT_MANIFEST_FILE};
use crate::error::{FetchError, SessionError};
use crate::fetch::{DirectoryFrameSource, FetchOutcome, FetchThread, FrameSource};
use crate::layer::{Layer, LayerCommand};

/// Description of a project's imagery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    /// Project identifier, also its directory name
    pub project_id: String,
    /// One name per channel
    pub channel_names: Vec<String>,
    /// Number of frames, shared by all channels
    pub num_frames: usize,
}

impl ProjectManifest {
    /// Read `<root>/<project_id>/project.json`.
    pub fn load(root: &Path, project_id: &str) -> Result<Self, SessionError> {
        let path = root.join(project_id).join(PROJECT_MANIFEST_FILE);
        if !path.is_file() {
            return Err(SessionError::ManifestNotFound { path });
        }

        let json = std::fs::read_to_string(&path)?;
        let manifest: Self = serde_json::from_str(&json)?;
        log::info!(
            "Loaded project '{}': {} channels, {} frames",
            manifest.project_id,
            manifest.num_channels(),
            manifest.num_frames
        );
        Ok(manifest)
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channel_names.len()
    }
}

/// Events reported by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Every channel has this frame cached
    FrameComplete(usize),
    /// A fetch failed; the frame stays unloaded on that channel
    FetchFailed {
        /// Channel index
        channel: usize,
        /// Frame index
        frame: usize,
    },
    /// The displayed frame switched
    FrameSelected(usize),
}

/// All channels of an open project.
pub struct Session {
    manifest: ProjectManifest,
    channels: Vec<ChannelController>,
    layers: Vec<Layer>,
    fetcher: FetchThread,
    /// `available[frame][channel]`
    available: Vec<Vec<bool>>,
    complete: Vec<bool>,
    frame: usize,
    /// Frame waiting for all channels before it is displayed
    requested_frame: Option<usize>,
    events: VecDeque<SessionEvent>,
    /// Time spent inside the frame source, summed over all fetches
    fetch_time: Duration,
}

impl Session {
    /// Open a session over `source`.
    pub fn open(
        source: Arc<dyn FrameSource>,
        manifest: ProjectManifest,
    ) -> Result<Self, SessionError> {
        Self::open_with_cutoff(source, manifest, DEFAULT_AUTO_RANGE_CUTOFF)
    }

    /// Open a session whose channels use `auto_range_cutoff`.
    pub fn open_with_cutoff(
        source: Arc<dyn FrameSource>,
        manifest: ProjectManifest,
        auto_range_cutoff: f64,
    ) -> Result<Self, SessionError> {
        let num_channels = manifest.num_channels();
        let total_frames = match NonZeroUsize::new(manifest.num_frames) {
            Some(frames) if num_channels > 0 => frames,
            _ => {
                return Err(SessionError::EmptyProject {
                    project_id: manifest.project_id,
                    channels: num_channels,
                    frames: manifest.num_frames,
                });
            }
        };

        let channels = (0..num_channels)
            .map(|channel| {
                ChannelController::new(manifest.project_id.clone(), channel, total_frames)
                    .with_auto_range_cutoff(auto_range_cutoff)
            })
            .collect();

        log::info!(
            "Opening session for '{}' ({} channels x {} frames)",
            manifest.project_id,
            num_channels,
            total_frames
        );

        Ok(Self {
            channels,
            layers: Layer::defaults(num_channels),
            fetcher: FetchThread::spawn(source)?,
            available: vec![vec![false; num_channels]; total_frames.get()],
            complete: vec![false; total_frames.get()],
            frame: 0,
            requested_frame: None,
            events: VecDeque::new(),
            fetch_time: Duration::ZERO,
            manifest,
        })
    }

    /// Open `<root>/<project_id>` from disk.
    pub fn open_directory(
        root: &Path,
        project_id: &str,
        auto_range_cutoff: f64,
    ) -> Result<Self, SessionError> {
        let manifest = ProjectManifest::load(root, project_id)?;
        let source = Arc::new(DirectoryFrameSource::new(root));
        Self::open_with_cutoff(source, manifest, auto_range_cutoff)
    }

    /// Project manifest.
    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }

    /// Channel controllers.
    pub fn channels(&self) -> &[ChannelController] {
        &self.channels
    }

    /// One channel controller.
    pub fn channel(&self, channel: usize) -> Option<&ChannelController> {
        self.channels.get(channel)
    }

    /// Display layers.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Displayed frame.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Whether every channel has `frame` cached.
    pub fn is_frame_complete(&self, frame: usize) -> bool {
        self.complete.get(frame).copied().unwrap_or(false)
    }

    /// Number of fetches in flight across all channels.
    pub fn pending_fetches(&self) -> usize {
        self.fetcher.pending_count()
    }

    /// Total time the frame source spent on fetches routed so far.
    pub fn fetch_time(&self) -> Duration {
        self.fetch_time
    }

    /// Drain the events reported so far.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    /// Send a command to one channel and carry out its effects.
    pub fn dispatch(&mut self, channel: usize, command: ChannelCommand) -> Result<(), FetchError> {
        let total = self.channels.len();
        let controller = self
            .channels
            .get_mut(channel)
            .ok_or(FetchError::ChannelOutOfRange { channel, total })?;

        let effects = controller.handle(command);
        self.apply_effects(effects);
        Ok(())
    }

    /// Send the same command to every channel.
    pub fn broadcast(&mut self, command: ChannelCommand) {
        for channel in 0..self.channels.len() {
            let effects = self.channels[channel].handle(command);
            self.apply_effects(effects);
        }
    }

    /// Apply a command to a layer. Out-of-range layers are ignored.
    pub fn dispatch_layer(&mut self, layer: usize, command: LayerCommand) {
        match self.layers.get_mut(layer) {
            Some(target) => target.handle(command),
            None => log::warn!("Ignoring command for missing layer {}", layer),
        }
    }

    /// Switch the display to `frame` once every channel has it.
    ///
    /// Frames already complete switch immediately. A channel that is busy
    /// queues the request; a later `Preload` does not displace it, so the
    /// switch still happens once the channel catches up.
    pub fn set_frame(&mut self, frame: usize) -> Result<(), FetchError> {
        let total = self.manifest.num_frames;
        if frame >= total {
            return Err(FetchError::FrameOutOfRange { frame, total });
        }

        self.requested_frame = Some(frame);
        self.broadcast(ChannelCommand::RequestFrame(frame));
        Ok(())
    }

    /// Derive auto ranges for every channel from the displayed frame.
    pub fn auto_range_all(&mut self) {
        self.broadcast(ChannelCommand::ComputeAutoRange);
    }

    fn apply_effects(&mut self, effects: Vec<ChannelEffect>) {
        let mut queue: VecDeque<ChannelEffect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            match effect {
                ChannelEffect::StartFetch(key) => {
                    if let Err(e) = self.fetcher.request(key.clone()) {
                        // surface as a failed fetch so the controller returns to idle
                        log::error!("Could not queue fetch of {}: {}", key, e);
                        self.events.push_back(SessionEvent::FetchFailed {
                            channel: key.channel,
                            frame: key.frame,
                        });
                        if let Some(controller) = self.channels.get_mut(key.channel) {
                            queue.extend(controller.complete_fetch(key.frame, Err(e)));
                        }
                    }
                }
                ChannelEffect::FrameAvailable { channel, frame } => {
                    self.mark_available(channel, frame);
                }
            }
        }
    }

    fn mark_available(&mut self, channel: usize, frame: usize) {
        let Some(row) = self.available.get_mut(frame) else {
            return;
        };
        if let Some(slot) = row.get_mut(channel) {
            *slot = true;
        }

        if !self.complete[frame] && row.iter().all(|&loaded| loaded) {
            self.complete[frame] = true;
            log::debug!("Frame {} complete on all channels", frame);
            self.events.push_back(SessionEvent::FrameComplete(frame));
        }

        if self.complete[frame] && self.requested_frame == Some(frame) {
            self.select_frame(frame);
        }
    }

    fn select_frame(&mut self, frame: usize) {
        self.requested_frame = None;
        for controller in &mut self.channels {
            // selection never produces effects
            controller.handle(ChannelCommand::SetCurrentFrame(frame));
        }
        if self.frame != frame {
            log::info!("Displaying frame {}", frame);
        }
        self.frame = frame;
        self.events.push_back(SessionEvent::FrameSelected(frame));
    }

    fn route(&mut self, outcome: FetchOutcome) {
        let FetchOutcome {
            key,
            result,
            elapsed,
        } = outcome;
        self.fetch_time += elapsed;
        log::trace!("Routing result of {} (fetched in {:?})", key, elapsed);

        let Some(controller) = self.channels.get_mut(key.channel) else {
            log::warn!("Dropping fetch result for unknown channel: {}", key);
            return;
        };

        if result.is_err() {
            self.events.push_back(SessionEvent::FetchFailed {
                channel: key.channel,
                frame: key.frame,
            });
        }

        let effects = controller.complete_fetch(key.frame, result);
        self.apply_effects(effects);
    }

    /// Process every fetch result that has already arrived. Non-blocking.
    ///
    /// Returns the number of results processed.
    pub fn poll(&mut self) -> usize {
        let mut processed = 0;
        while let Some(outcome) = self.fetcher.take_one_result() {
            self.route(outcome);
            processed += 1;
        }
        processed
    }

    /// Block until one fetch result arrives and process it.
    ///
    /// Returns `false` when nothing was in flight.
    pub fn wait_one(&mut self) -> bool {
        match self.fetcher.wait_result() {
            Some(outcome) => {
                self.route(outcome);
                true
            }
            None => false,
        }
    }

    /// Block until no fetch is in flight.
    pub fn wait_idle(&mut self) {
        while self.wait_one() {}
    }

    /// Load every frame of every channel.
    ///
    /// Each channel preloads outward from its current frame. A channel stops
    /// after its first failure in this pass, since preload would only pick
    /// the same frame again. Returns the number of frames still missing
    /// across all channels.
    pub fn preload_all(&mut self) -> usize {
        let mut stalled: HashSet<usize> = HashSet::new();
        let first_event = self.events.len();

        loop {
            for channel in 0..self.channels.len() {
                let controller = &self.channels[channel];
                if stalled.contains(&channel)
                    || controller.is_fetching()
                    || controller.is_fully_loaded()
                {
                    continue;
                }
                let effects = self.channels[channel].handle(ChannelCommand::Preload);
                self.apply_effects(effects);
            }

            if !self.wait_one() {
                break;
            }

            for event in self.events.iter().skip(first_event) {
                if let SessionEvent::FetchFailed { channel, .. } = event {
                    stalled.insert(*channel);
                }
            }
        }

        let missing: usize = self
            .channels
            .iter()
            .map(|c| c.total_frames() - c.cached_count())
            .sum();
        log::info!(
            "Preload finished: {} frames missing, {} channels stalled",
            missing,
            stalled.len()
        );
        missing
    }
}
