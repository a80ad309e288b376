//! Command-line access to the playback capabilities, one action per run.
//!
//! Useful for completing the first-run authorization before starting the
//! camera app, and for checking the volume backend on a new machine.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gesture_core::{PlaybackClient, VolumeControl};
use playback_control::{connect, stdin_prompt, volume, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(name = "playback_ctl", about = "Spotify playback and system volume from the shell")]
struct Cli {
    /// Spotify credentials file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Change system volume by DELTA percentage points
    Volume {
        #[arg(allow_hyphen_values = true)]
        delta: i32,
    },
    #[command(flatten)]
    Spotify(SpotifyCommand),
}

/// Subcommands that need a Spotify connection.
#[derive(Subcommand, Debug)]
enum SpotifyCommand {
    /// Run the authorization handshake and cache the token
    Auth,
    /// Show playback state and available devices
    Status,
    Play,
    Pause,
    Next,
    Prev,
    /// Save the current track to the library
    Like,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Volume { delta } => {
            let mut v = volume::probe();
            let level = v.adjust_volume(delta)
                .with_context(|| format!("adjusting volume via {}", v.backend_name()))?;
            println!("volume {}% ({})", level, v.backend_name());
            Ok(())
        }
        Command::Spotify(command) => spotify_command(&cli.config, command),
    }
}

fn spotify_command(config: &str, command: SpotifyCommand) -> Result<()> {
    let mut spotify = connect(config, stdin_prompt)
        .with_context(|| format!("connecting with credentials from {}", config))?;

    match command {
        SpotifyCommand::Auth => println!("token cached"),
        SpotifyCommand::Status => {
            let state = spotify.current_playback().context("reading playback state")?;
            let devices = spotify.devices().context("listing devices")?;
            match state {
                Some(state) => {
                    println!("playing: {}", state.is_playing);
                    println!("track:   {}", state.item.as_deref().unwrap_or("-"));
                }
                None => println!("playing: no active session"),
            }
            println!("devices: {}", if devices.is_empty() { "-".to_string() } else { devices.join(", ") });
        }
        SpotifyCommand::Play  => spotify.start_playback().context("starting playback")?,
        SpotifyCommand::Pause => spotify.pause_playback().context("pausing playback")?,
        SpotifyCommand::Next  => spotify.next_track().context("skipping to next track")?,
        SpotifyCommand::Prev  => spotify.previous_track().context("returning to previous track")?,
        SpotifyCommand::Like  => {
            let state = spotify.current_playback().context("reading playback state")?;
            let id = state.and_then(|s| s.item).context("no song is currently playing")?;
            spotify.save_track(&id).context("saving track")?;
            println!("liked track {}", id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("playback_ctl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn volume_accepts_negative_delta() {
        assert!(matches!(parse(&["volume", "-10"]).command, Command::Volume { delta: -10 }));
    }

    #[test]
    fn spotify_subcommands_stay_top_level() {
        assert!(matches!(parse(&["pause"]).command, Command::Spotify(SpotifyCommand::Pause)));
        let cli = parse(&["--config", "alt.ini", "like"]);
        assert_eq!(cli.config, "alt.ini");
        assert!(matches!(cli.command, Command::Spotify(SpotifyCommand::Like)));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
