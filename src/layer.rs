//! Display layers.
//!
//! A layer shows one channel in one color on top of the others. Layers are
//! independent of channel controllers: switching a layer to another channel
//! only changes which controller's pixels it draws.

use crate::color_utils;
use crate::constants::SINGLE_CHANNEL_COLOR;

/// Commands accepted by a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerCommand {
    /// Show a different channel
    SetChannel(usize),
    /// Show or hide the layer
    ToggleOn,
    /// Change the layer color
    SetColor([u8; 3]),
}

/// One colored channel overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    channel: usize,
    num_channels: usize,
    on: bool,
    color: [u8; 3],
}

impl Layer {
    /// Create a visible layer for `channel`.
    pub fn new(channel: usize, num_channels: usize, color: [u8; 3]) -> Self {
        Self {
            channel: channel.min(num_channels.saturating_sub(1)),
            num_channels,
            on: true,
            color,
        }
    }

    /// Default layers of a project: one per channel, white for a
    /// single-channel project, palette colors otherwise.
    pub fn defaults(num_channels: usize) -> Vec<Self> {
        if num_channels == 1 {
            return vec![Self::new(0, 1, SINGLE_CHANNEL_COLOR)];
        }
        (0..num_channels)
            .map(|channel| Self::new(channel, num_channels, color_utils::channel_color(channel)))
            .collect()
    }

    /// Channel shown by this layer.
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Whether the layer is visible.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Layer color.
    pub fn color(&self) -> [u8; 3] {
        self.color
    }

    /// Layer color as `#RRGGBB`.
    pub fn color_hex(&self) -> String {
        color_utils::to_hex(self.color)
    }

    /// Color for the layer's on/off swatch. White would vanish on a light
    /// background, so it is drawn black.
    pub fn swatch_color(&self) -> [u8; 3] {
        if self.color == [255, 255, 255] {
            [0, 0, 0]
        } else {
            self.color
        }
    }

    /// Apply a command.
    pub fn handle(&mut self, command: LayerCommand) {
        match command {
            LayerCommand::SetChannel(channel) if channel < self.num_channels => {
                self.channel = channel;
            }
            LayerCommand::SetChannel(channel) => {
                log::warn!(
                    "Ignoring layer channel {} ({} channels)",
                    channel,
                    self.num_channels
                );
            }
            LayerCommand::ToggleOn => self.on = !self.on,
            LayerCommand::SetColor(color) => self.color = color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_channel_default_is_white() {
        let layers = Layer::defaults(1);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].color_hex(), "#FFFFFF");
        assert_eq!(layers[0].swatch_color(), [0, 0, 0]);
        assert!(layers[0].is_on());
    }

    #[test]
    fn test_multi_channel_defaults() {
        let layers = Layer::defaults(3);
        let channels: Vec<usize> = layers.iter().map(Layer::channel).collect();
        assert_eq!(channels, vec![0, 1, 2]);
        assert_eq!(layers[0].color_hex(), "#FF0000");
        assert_eq!(layers[1].swatch_color(), [0, 255, 0]);
    }

    #[test]
    fn test_set_channel_bounds() {
        let mut layer = Layer::new(0, 3, [255, 0, 0]);
        layer.handle(LayerCommand::SetChannel(2));
        assert_eq!(layer.channel(), 2);
        layer.handle(LayerCommand::SetChannel(3));
        assert_eq!(layer.channel(), 2);
    }

    #[test]
    fn test_toggle_and_color() {
        let mut layer = Layer::new(1, 2, [0, 255, 0]);
        layer.handle(LayerCommand::ToggleOn);
        assert!(!layer.is_on());
        layer.handle(LayerCommand::ToggleOn);
        assert!(layer.is_on());

        layer.handle(LayerCommand::SetColor([255, 255, 255]));
        assert_eq!(layer.color(), [255, 255, 255]);
        assert_eq!(layer.swatch_color(), [0, 0, 0]);
    }
}
