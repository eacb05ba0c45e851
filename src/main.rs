//! Native command line front end.
//!
//! Opens a project, selects a frame, optionally preloads every frame and
//! prints each channel's cache fill and auto intensity range.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use cellview::color_utils;
use cellview::config::ViewerConfig;
use cellview::layer::LayerCommand;
use cellview::{ChannelCommand, Session, SessionError};

#[derive(Parser, Debug)]
#[command(
    name = "cellview-native",
    version,
    about = "Open a multi-channel project and report each channel's display range"
)]
struct Args {
    /// Project to open, a directory under the configured data root
    project_id: String,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame to display
    #[arg(long, default_value_t = 0)]
    frame: usize,

    /// Layer color override, repeatable
    #[arg(long = "color", value_name = "CHANNEL=#RRGGBB", value_parser = parse_layer_color)]
    colors: Vec<LayerColor>,
}

/// `--color` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LayerColor {
    channel: usize,
    color: [u8; 3],
}

fn parse_layer_color(text: &str) -> Result<LayerColor, String> {
    let (channel, color) = text
        .split_once('=')
        .ok_or_else(|| format!("expected CHANNEL=#RRGGBB, got '{}'", text))?;
    let channel = channel
        .trim()
        .parse()
        .map_err(|_| format!("invalid channel '{}'", channel))?;
    let color = color_utils::parse_hex(color).ok_or_else(|| format!("invalid color '{}'", color))?;
    Ok(LayerColor { channel, color })
}

fn init_logging(config: &ViewerConfig) {
    // RUST_LOG overrides the configured level
    let initialized = env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
    if initialized.is_err() {
        log::debug!("Logger already installed, keeping it");
    }
}

fn run(args: Args) -> Result<(), SessionError> {
    let config = ViewerConfig::load_or_default(args.config.as_deref())?;
    init_logging(&config);
    log::info!("cellview-native starting, data root {:?}", config.data_root);

    let cutoff = config.preferences.effective_auto_range_cutoff();
    let mut session = Session::open_directory(&config.data_root, &args.project_id, cutoff)?;

    for LayerColor { channel, color } in args.colors {
        session.dispatch_layer(channel, LayerCommand::SetColor(color));
    }

    session.set_frame(args.frame)?;
    session.wait_idle();
    if session.frame() != args.frame {
        log::warn!(
            "Frame {} is not available on every channel, showing frame {}",
            args.frame,
            session.frame()
        );
    }

    if config.preferences.preload_on_open {
        let missing = session.preload_all();
        if missing > 0 {
            log::warn!("{} frames could not be loaded", missing);
        }
    }
    log::info!("Frame source busy for {:?} in total", session.fetch_time());

    // channels may have gained the displayed frame during preload
    session.broadcast(ChannelCommand::SetCurrentFrame(session.frame()));
    session.auto_range_all();

    let manifest = session.manifest();
    for (controller, layer) in session.channels().iter().zip(session.layers()) {
        let name = manifest
            .channel_names
            .get(controller.channel())
            .map_or("?", String::as_str);
        let (lo, hi) = controller.display().range().as_tuple();
        println!(
            "{:>2} {:<16} {} cached {:>4}/{:<4} range {:>3}-{:<3}",
            controller.channel(),
            name,
            layer.color_hex(),
            controller.cached_count(),
            controller.total_frames(),
            lo,
            hi
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_minimal() {
        let args = Args::try_parse_from(["cellview-native", "embryo"]).unwrap();
        assert_eq!(args.project_id, "embryo");
        assert_eq!(args.config, None);
        assert_eq!(args.frame, 0);
        assert!(args.colors.is_empty());
    }

    #[test]
    fn test_parse_options() {
        let args = Args::try_parse_from([
            "cellview-native",
            "--frame",
            "7",
            "embryo",
            "--config",
            "/tmp/c.json",
            "--color",
            "1=#00ff00",
            "--color",
            "0=FF0000",
        ])
        .unwrap();
        assert_eq!(args.project_id, "embryo");
        assert_eq!(args.frame, 7);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.json")));
        assert_eq!(
            args.colors,
            vec![
                LayerColor {
                    channel: 1,
                    color: [0, 255, 0]
                },
                LayerColor {
                    channel: 0,
                    color: [255, 0, 0]
                },
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Args::try_parse_from(["cellview-native"]).is_err());
        assert!(Args::try_parse_from(["cellview-native", "a", "b"]).is_err());
        assert!(Args::try_parse_from(["cellview-native", "a", "--frame"]).is_err());
        assert!(Args::try_parse_from(["cellview-native", "a", "--frame", "x"]).is_err());
        assert!(Args::try_parse_from(["cellview-native", "a", "--verbose"]).is_err());
        assert!(Args::try_parse_from(["cellview-native", "a", "--color", "1"]).is_err());
        assert!(Args::try_parse_from(["cellview-native", "a", "--color", "x=#FFFFFF"]).is_err());
        assert!(Args::try_parse_from(["cellview-native", "a", "--color", "1=#FFF"]).is_err());
    }

    #[test]
    fn test_missing_project_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let mut config = ViewerConfig::new();
        config.data_root = dir.path().join("data");
        config.save(&config_path).unwrap();

        let args = Args::try_parse_from([
            "cellview-native",
            "absent",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();
        assert!(matches!(run(args), Err(SessionError::ManifestNotFound { .. })));
    }

    #[test]
    fn test_bad_config_is_a_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "{ not json").unwrap();

        let args = Args::try_parse_from([
            "cellview-native",
            "embryo",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();
        assert!(matches!(run(args), Err(SessionError::Config(_))));
    }
}
