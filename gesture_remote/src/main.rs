//! gesture_remote — camera hand gestures to Spotify playback and volume.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Result};
use clap::Parser;
use gesture_core::MAX_HOLD;
use gesture_remote::app::{run, AppConfig, InputMode};
use gesture_remote::detector::DEFAULT_MIN_CONFIDENCE;
use playback_control::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "gesture_remote", about = "Control Spotify and system volume with hand gestures")]
#[cfg_attr(not(feature = "camera"), allow(dead_code))]
struct Args {
    /// Spotify credentials file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Only log playback commands; no Spotify account needed
    #[arg(long)]
    offline: bool,

    /// Seconds a recognised gesture is held before it can fire again
    #[arg(long, default_value_t = 3.0)]
    hold_secs: f64,

    /// Webcam index
    #[arg(long, default_value_t = 0)]
    camera_index: u32,

    /// Minimum hand detection score (0–1)
    #[arg(long, default_value_t = DEFAULT_MIN_CONFIDENCE)]
    min_confidence: f32,

    /// Python interpreter with mediapipe installed
    #[arg(long, default_value = "python3")]
    python: PathBuf,

    /// MediaPipe helper script
    #[arg(long, default_value = "scripts/hand_detect.py")]
    detector_script: PathBuf,

    /// Use the simulated hand even when built with camera support
    #[arg(long)]
    simulate: bool,

    /// Show the camera unmirrored
    #[arg(long)]
    no_mirror: bool,

    /// Start the gesture loop immediately
    #[arg(long)]
    autostart: bool,
}

fn input_mode(args: &Args) -> InputMode {
    #[cfg(feature = "camera")]
    if !args.simulate {
        return InputMode::Camera {
            index:  args.camera_index,
            python: args.python.clone(),
            script: args.detector_script.clone(),
        };
    }
    let _ = args;
    InputMode::Simulated
}

fn validate(args: &Args) -> Result<()> {
    ensure!(
        args.hold_secs.is_finite() && args.hold_secs > 0.0 && args.hold_secs <= MAX_HOLD.as_secs_f64(),
        "--hold-secs must be between 0 and {}", MAX_HOLD.as_secs()
    );
    ensure!((0.0..=1.0).contains(&args.min_confidence), "--min-confidence must be within 0–1");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    validate(&args)?;

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Gesture Remote — hand gestures for Spotify            ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let input = input_mode(&args);
    match input {
        InputMode::Simulated => {
            println!("  Mode: Keyboard simulation  (build with --features camera for a webcam)");
            println!("  Keys 1–7 pose the hand, 0 removes it.");
        }
        #[cfg(feature = "camera")]
        InputMode::Camera { index, .. } => println!("  Mode: Webcam #{}", index),
    }
    if args.offline {
        println!("  Offline: playback commands are logged, not sent.");
    }
    println!("  G or the button starts/stops recognition; Q quits.");
    println!();

    let cfg = AppConfig {
        config_path:    args.config,
        offline:        args.offline,
        hold:           Duration::from_secs_f64(args.hold_secs),
        min_confidence: args.min_confidence,
        mirror:         !args.no_mirror,
        input,
        autostart:      args.autostart,
        ..AppConfig::default()
    };
    run(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("gesture_remote").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let a = args(&[]);
        assert!(validate(&a).is_ok());
        assert_eq!(a.hold_secs, 3.0);
    }

    #[test]
    fn hold_secs_must_fit_the_hold_limit() {
        assert!(validate(&args(&["--hold-secs", "3600"])).is_ok());
        assert!(validate(&args(&["--hold-secs", "3600.5"])).is_err());
        assert!(validate(&args(&["--hold-secs", "1e30"])).is_err());
        assert!(validate(&args(&["--hold-secs", "0"])).is_err());
        assert!(validate(&args(&["--hold-secs", "NaN"])).is_err());
    }

    #[test]
    fn min_confidence_is_a_probability() {
        assert!(validate(&args(&["--min-confidence", "0.5"])).is_ok());
        assert!(validate(&args(&["--min-confidence", "1.5"])).is_err());
    }
}
