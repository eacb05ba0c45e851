//! The channel controller state machine.
//!
//! States:
//! - `Idle`: no fetch outstanding
//! - `Fetching { frame }`: exactly one fetch outstanding
//!
//! Every fetch-initiating command passes through a cache check: a cached
//! frame is reported available right away, anything else starts a fetch.
//! While a fetch is running, one further uncached request is remembered and
//! replayed once the fetch resolves (the latest request wins).

use std::num::NonZeroUsize;

use super::auto_range::auto_range;
use super::display::DisplaySettings;
use crate::constants::DEFAULT_AUTO_RANGE_CUTOFF;
use crate::data::RawFrame;
use crate::error::FetchError;
use crate::fetch::FrameKey;

/// Load state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No fetch outstanding
    Idle,
    /// A fetch for `frame` is outstanding
    Fetching {
        /// The frame being fetched
        frame: usize,
    },
}

/// Commands accepted by a channel controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelCommand {
    /// Make a frame available, fetching it if needed
    RequestFrame(usize),
    /// Fetch the unloaded frame nearest to the current frame
    Preload,
    /// Select the frame to display; never fetches
    SetCurrentFrame(usize),
    /// Flip inversion
    ToggleInvert,
    /// Set the intensity window
    SetRange(i32, i32),
    /// Set brightness
    SetBrightness(f32),
    /// Set contrast
    SetContrast(f32),
    /// Restore default range, brightness and contrast
    ResetDisplay,
    /// Derive the intensity window from the displayed frame
    ComputeAutoRange,
}

/// Side effects requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEffect {
    /// Start fetching a frame; the result must be handed back through
    /// [`ChannelController::complete_fetch`]
    StartFetch(FrameKey),
    /// A frame of this channel is cached and ready
    FrameAvailable {
        /// Channel index
        channel: usize,
        /// Frame index
        frame: usize,
    },
}

/// Frame cache, load state and display settings of one channel.
#[derive(Debug)]
pub struct ChannelController {
    project_id: String,
    channel: usize,
    current_frame: usize,
    state: LoadState,
    /// Fetch-initiating command deferred while fetching
    queued: Option<ChannelCommand>,
    /// One slot per frame, filled as frames arrive
    cache: Vec<Option<RawFrame>>,
    cached_count: usize,
    /// Frame whose pixels are selected for display
    active_frame: Option<usize>,
    display: DisplaySettings,
    auto_range_cutoff: f64,
}

impl ChannelController {
    /// Create a controller for `channel` of `project_id` with `total_frames` frames.
    pub fn new(project_id: impl Into<String>, channel: usize, total_frames: NonZeroUsize) -> Self {
        Self {
            project_id: project_id.into(),
            channel,
            current_frame: 0,
            state: LoadState::Idle,
            queued: None,
            cache: vec![None; total_frames.get()],
            cached_count: 0,
            active_frame: None,
            display: DisplaySettings::default(),
            auto_range_cutoff: DEFAULT_AUTO_RANGE_CUTOFF,
        }
    }

    /// Use a different percentile cutoff for [`ChannelCommand::ComputeAutoRange`].
    ///
    /// The cutoff must lie in `[0, 0.5)`; anything else falls back to the default.
    pub fn with_auto_range_cutoff(mut self, cutoff: f64) -> Self {
        if (0.0..0.5).contains(&cutoff) {
            self.auto_range_cutoff = cutoff;
        } else {
            log::warn!(
                "Channel {}: auto range cutoff {} outside [0, 0.5), using {}",
                self.channel,
                cutoff,
                DEFAULT_AUTO_RANGE_CUTOFF
            );
            self.auto_range_cutoff = DEFAULT_AUTO_RANGE_CUTOFF;
        }
        self
    }

    /// Percentile cutoff used by auto range.
    pub fn auto_range_cutoff(&self) -> f64 {
        self.auto_range_cutoff
    }

    /// Channel index.
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Project identifier.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Total number of frames in the channel.
    pub fn total_frames(&self) -> usize {
        self.cache.len()
    }

    /// Frame selected for display.
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Load state.
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Frame currently being fetched, if any.
    pub fn pending_frame(&self) -> Option<usize> {
        match self.state {
            LoadState::Idle => None,
            LoadState::Fetching { frame } => Some(frame),
        }
    }

    /// Whether a fetch is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.pending_frame().is_some()
    }

    /// Command deferred until the outstanding fetch resolves.
    pub fn queued(&self) -> Option<ChannelCommand> {
        self.queued
    }

    /// Whether `frame` is cached.
    pub fn is_cached(&self, frame: usize) -> bool {
        self.frame(frame).is_some()
    }

    /// Cached data of `frame`.
    pub fn frame(&self, frame: usize) -> Option<&RawFrame> {
        self.cache.get(frame).and_then(Option::as_ref)
    }

    /// Number of cached frames.
    pub fn cached_count(&self) -> usize {
        self.cached_count
    }

    /// Whether every frame is cached.
    pub fn is_fully_loaded(&self) -> bool {
        self.cached_count == self.cache.len()
    }

    /// Pixels selected for display, if the displayed frame was cached when selected.
    pub fn active_frame(&self) -> Option<&RawFrame> {
        self.active_frame.and_then(|f| self.frame(f))
    }

    /// Display settings.
    pub fn display(&self) -> &DisplaySettings {
        &self.display
    }

    /// Apply a command and return the effects it produced.
    pub fn handle(&mut self, command: ChannelCommand) -> Vec<ChannelEffect> {
        let mut effects = Vec::new();
        self.apply(command, &mut effects);
        effects
    }

    fn apply(&mut self, command: ChannelCommand, effects: &mut Vec<ChannelEffect>) {
        match command {
            ChannelCommand::RequestFrame(frame) => self.request_frame(frame, effects),
            ChannelCommand::Preload => self.preload(effects),
            ChannelCommand::SetCurrentFrame(frame) => self.set_current_frame(frame),
            ChannelCommand::ToggleInvert => self.display.toggle_invert(),
            ChannelCommand::SetRange(lo, hi) => self.display.set_range(lo, hi),
            ChannelCommand::SetBrightness(brightness) => self.display.set_brightness(brightness),
            ChannelCommand::SetContrast(contrast) => self.display.set_contrast(contrast),
            ChannelCommand::ResetDisplay => self.display.reset(),
            ChannelCommand::ComputeAutoRange => self.compute_auto_range(),
        }
    }

    fn request_frame(&mut self, frame: usize, effects: &mut Vec<ChannelEffect>) {
        if frame >= self.cache.len() {
            log::warn!(
                "Channel {}: ignoring request for frame {} ({} frames)",
                self.channel,
                frame,
                self.cache.len()
            );
            return;
        }

        match self.state {
            LoadState::Fetching { frame: pending } if pending == frame => {
                log::trace!(
                    "Channel {}: frame {} already being fetched",
                    self.channel,
                    frame
                );
            }
            LoadState::Fetching { .. } if !self.is_cached(frame) => {
                self.defer(ChannelCommand::RequestFrame(frame));
            }
            _ => self.check_cache(frame, effects),
        }
    }

    fn preload(&mut self, effects: &mut Vec<ChannelEffect>) {
        if self.is_fetching() {
            self.defer(ChannelCommand::Preload);
            return;
        }

        match self.preload_target() {
            Some(frame) => self.check_cache(frame, effects),
            None => log::trace!("Channel {}: all frames cached", self.channel),
        }
    }

    /// Queue a fetch-initiating command until the running fetch resolves.
    ///
    /// The latest command wins, except that a preload never displaces an
    /// explicit frame request.
    fn defer(&mut self, command: ChannelCommand) {
        if let (ChannelCommand::Preload, Some(queued @ ChannelCommand::RequestFrame(_))) =
            (command, self.queued)
        {
            log::trace!(
                "Channel {}: keeping queued {:?} over preload",
                self.channel,
                queued
            );
            return;
        }

        if let Some(replaced) = self.queued.replace(command) {
            log::trace!(
                "Channel {}: {:?} replaces queued {:?}",
                self.channel,
                command,
                replaced
            );
        } else {
            log::trace!("Channel {}: queued {:?}", self.channel, command);
        }
    }

    /// The unloaded frame closest to the current frame.
    ///
    /// Scans in ascending order and keeps the first strictly closer frame,
    /// so ties go to the lower index.
    pub fn preload_target(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (frame, slot) in self.cache.iter().enumerate() {
            if slot.is_some() {
                continue;
            }
            let distance = frame.abs_diff(self.current_frame);
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((frame, distance));
            }
        }
        best.map(|(frame, _)| frame)
    }

    /// Report a cached frame, or start fetching it.
    fn check_cache(&mut self, frame: usize, effects: &mut Vec<ChannelEffect>) {
        if self.is_cached(frame) {
            effects.push(self.available(frame));
            return;
        }

        log::debug!("Channel {}: fetching frame {}", self.channel, frame);
        self.state = LoadState::Fetching { frame };
        effects.push(ChannelEffect::StartFetch(FrameKey::new(
            self.project_id.clone(),
            self.channel,
            frame,
        )));
    }

    fn available(&self, frame: usize) -> ChannelEffect {
        ChannelEffect::FrameAvailable {
            channel: self.channel,
            frame,
        }
    }

    fn set_current_frame(&mut self, frame: usize) {
        if frame >= self.cache.len() {
            log::warn!(
                "Channel {}: ignoring selection of frame {} ({} frames)",
                self.channel,
                frame,
                self.cache.len()
            );
            return;
        }

        self.current_frame = frame;
        self.active_frame = self.is_cached(frame).then_some(frame);
    }

    fn compute_auto_range(&mut self) {
        let pixels = self.active_frame().map(RawFrame::pixels);
        let range = auto_range(pixels, self.auto_range_cutoff);
        log::debug!(
            "Channel {}: auto range {:?}",
            self.channel,
            range.as_tuple()
        );
        self.display.set_range(i32::from(range.lo()), i32::from(range.hi()));
    }

    /// Hand back the result of the fetch started for `frame`.
    ///
    /// On success the frame is cached and reported available; on failure it
    /// stays unloaded. Either way the controller returns to idle and replays
    /// any request deferred during the fetch. Results for a frame that is
    /// not being fetched are dropped.
    pub fn complete_fetch(
        &mut self,
        frame: usize,
        result: Result<RawFrame, FetchError>,
    ) -> Vec<ChannelEffect> {
        let mut effects = Vec::new();

        if self.pending_frame() != Some(frame) {
            log::warn!(
                "Channel {}: dropping unexpected fetch result for frame {} (state {:?})",
                self.channel,
                frame,
                self.state
            );
            return effects;
        }

        self.state = LoadState::Idle;

        match result {
            Ok(data) => {
                if let Some(slot) = self.cache.get_mut(frame) {
                    if slot.replace(data).is_none() {
                        self.cached_count += 1;
                    }
                }
                log::debug!(
                    "Channel {}: cached frame {} ({}/{})",
                    self.channel,
                    frame,
                    self.cached_count,
                    self.cache.len()
                );
                effects.push(self.available(frame));
            }
            Err(e) => {
                log::warn!(
                    "Channel {}: failed to load frame {}: {}",
                    self.channel,
                    frame,
                    e
                );
            }
        }

        if let Some(command) = self.queued.take() {
            log::trace!("Channel {}: replaying {:?}", self.channel, command);
            self.apply(command, &mut effects);
        }

        effects
    }
}
