//! System output volume backends.
//!
//! One implementation per platform, chosen at startup by [`probe`], which
//! asks each backend whether its tool actually works on this machine.
//! When none does, the result is a [`NoVolume`] that reports
//! `NotSupported` on every call instead of silently doing nothing.
//!
//! | Backend | Platform | Tool |
//! |---|---|---|
//! | `EndpointVolume` | Windows | Core Audio `IAudioEndpointVolume` |
//! | [`AppleScriptVolume`] | macOS | `osascript` |
//! | [`PulseAudioVolume`] | Linux | `pactl` (PulseAudio / PipeWire) |

use std::process::Command;

use gesture_core::{clamp_level, ActionError, NoVolume, VolumeControl};

fn run(program: &str, args: &[&str]) -> Result<String, ActionError> {
    let out = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| ActionError::Other(format!("{}: {}", program, e)))?;
    if !out.status.success() {
        let err = String::from_utf8_lossy(&out.stderr).trim().to_string();
        return Err(ActionError::Other(format!("{} failed: {}", program, err)));
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

// ════════════════════════════════════════════════════════════════════════════
// Windows
// ════════════════════════════════════════════════════════════════════════════

/// Core Audio master level (0.0–1.0) → percent.
pub fn scalar_to_percent(scalar: f32) -> i32 {
    (scalar.clamp(0.0, 1.0) * 100.0).round() as i32
}

/// Percent → Core Audio master level.
pub fn percent_to_scalar(level: u8) -> f32 {
    f32::from(level.min(100)) / 100.0
}

#[cfg(target_os = "windows")]
pub use endpoint::EndpointVolume;

#[cfg(target_os = "windows")]
mod endpoint {
    use std::ptr;

    use gesture_core::{clamp_level, ActionError, VolumeControl};
    use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolume;
    use windows::Win32::Media::Audio::{eConsole, eRender, IMMDeviceEnumerator, MMDeviceEnumerator};
    use windows::Win32::System::Com::{CoCreateInstance, CoInitializeEx, CLSCTX_ALL, COINIT_MULTITHREADED};

    use super::{percent_to_scalar, scalar_to_percent};

    fn core_audio(e: windows::core::Error) -> ActionError {
        ActionError::Other(format!("Core Audio: {}", e))
    }

    /// Default render endpoint.  The COM interface is not `Send`, so it is
    /// opened per call on whichever thread adjusts the volume.
    #[derive(Debug, Default)]
    pub struct EndpointVolume;

    impl EndpointVolume {
        pub fn probe() -> Option<Self> {
            match Self::open() {
                Ok(_) => Some(EndpointVolume),
                Err(e) => {
                    log::debug!("Core Audio endpoint unavailable: {}", e);
                    None
                }
            }
        }

        fn open() -> windows::core::Result<IAudioEndpointVolume> {
            unsafe {
                // S_FALSE and RPC_E_CHANGED_MODE both leave COM usable here.
                let _ = CoInitializeEx(None, COINIT_MULTITHREADED);
                let enumerator: IMMDeviceEnumerator =
                    CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)?;
                let device = enumerator.GetDefaultAudioEndpoint(eRender, eConsole)?;
                device.Activate(CLSCTX_ALL, None)
            }
        }
    }

    impl VolumeControl for EndpointVolume {
        fn adjust_volume(&mut self, delta: i32) -> Result<u8, ActionError> {
            let endpoint = Self::open().map_err(core_audio)?;
            unsafe {
                let current = endpoint.GetMasterVolumeLevelScalar().map_err(core_audio)?;
                let level = clamp_level(scalar_to_percent(current), delta);
                endpoint
                    .SetMasterVolumeLevelScalar(percent_to_scalar(level), ptr::null())
                    .map_err(core_audio)?;
                Ok(level)
            }
        }

        fn backend_name(&self) -> &str { "core-audio" }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// macOS
// ════════════════════════════════════════════════════════════════════════════

/// `osascript -e 'output volume of (get volume settings)'` → "42".
pub fn parse_osascript_level(output: &str) -> Option<i32> {
    output.trim().parse().ok()
}

#[derive(Debug, Default)]
pub struct AppleScriptVolume;

impl AppleScriptVolume {
    const GET: &'static str = "output volume of (get volume settings)";

    pub fn probe() -> Option<Self> {
        if !cfg!(target_os = "macos") {
            return None;
        }
        run("osascript", &["-e", Self::GET]).ok()
            .and_then(|out| parse_osascript_level(&out))
            .map(|_| AppleScriptVolume)
    }

    fn current(&self) -> Result<i32, ActionError> {
        let out = run("osascript", &["-e", Self::GET])?;
        parse_osascript_level(&out)
            .ok_or_else(|| ActionError::Other(format!("unexpected osascript output {:?}", out)))
    }
}

impl VolumeControl for AppleScriptVolume {
    fn adjust_volume(&mut self, delta: i32) -> Result<u8, ActionError> {
        let level = clamp_level(self.current()?, delta);
        run("osascript", &["-e", &format!("set volume output volume {}", level)])?;
        Ok(level)
    }

    fn backend_name(&self) -> &str { "osascript" }
}

// ════════════════════════════════════════════════════════════════════════════
// Linux
// ════════════════════════════════════════════════════════════════════════════

/// First percentage in `pactl get-sink-volume` output, e.g.
/// `Volume: front-left: 32768 /  50% / -18.06 dB, …` → 50.
pub fn parse_pactl_level(output: &str) -> Option<i32> {
    output
        .split('/')
        .map(str::trim)
        .find_map(|part| part.strip_suffix('%'))
        .and_then(|pct| pct.trim().parse().ok())
}

#[derive(Debug)]
pub struct PulseAudioVolume {
    sink: String,
}

impl PulseAudioVolume {
    pub const DEFAULT_SINK: &'static str = "@DEFAULT_SINK@";

    pub fn probe() -> Option<Self> {
        if !cfg!(target_os = "linux") {
            return None;
        }
        let v = PulseAudioVolume { sink: Self::DEFAULT_SINK.to_string() };
        v.current().ok().map(|_| v)
    }

    fn current(&self) -> Result<i32, ActionError> {
        let out = run("pactl", &["get-sink-volume", &self.sink])?;
        parse_pactl_level(&out)
            .ok_or_else(|| ActionError::Other(format!("unexpected pactl output {:?}", out)))
    }
}

impl VolumeControl for PulseAudioVolume {
    fn adjust_volume(&mut self, delta: i32) -> Result<u8, ActionError> {
        let level = clamp_level(self.current()?, delta);
        run("pactl", &["set-sink-volume", &self.sink, &format!("{}%", level)])?;
        Ok(level)
    }

    fn backend_name(&self) -> &str { "pactl" }
}

// ════════════════════════════════════════════════════════════════════════════
// probe
// ════════════════════════════════════════════════════════════════════════════

/// Pick the first backend that works on this machine.
pub fn probe() -> Box<dyn VolumeControl + Send> {
    #[cfg(target_os = "windows")]
    if let Some(v) = EndpointVolume::probe() {
        log::info!("volume backend: core-audio");
        return Box::new(v);
    }
    if let Some(v) = AppleScriptVolume::probe() {
        log::info!("volume backend: osascript");
        return Box::new(v);
    }
    if let Some(v) = PulseAudioVolume::probe() {
        log::info!("volume backend: pactl");
        return Box::new(v);
    }
    log::warn!("no volume backend available on {}; volume gestures will be reported as unsupported",
               std::env::consts::OS);
    Box::new(NoVolume::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osascript_level_parses_integer() {
        assert_eq!(parse_osascript_level("42\n"), Some(42));
        assert_eq!(parse_osascript_level("missing value"), None);
    }

    #[test]
    fn pactl_level_takes_first_channel() {
        let out = "Volume: front-left: 32768 /  50% / -18.06 dB,   front-right: 32768 /  50% / -18.06 dB\n        balance 0.00\n";
        assert_eq!(parse_pactl_level(out), Some(50));
    }

    #[test]
    fn pactl_level_handles_mono() {
        assert_eq!(parse_pactl_level("Volume: mono: 65536 / 100% / 0.00 dB"), Some(100));
        assert_eq!(parse_pactl_level("No such entity"), None);
    }

    #[test]
    fn core_audio_scalar_maps_to_percent() {
        assert_eq!(scalar_to_percent(0.0), 0);
        assert_eq!(scalar_to_percent(0.426), 43);
        assert_eq!(scalar_to_percent(1.0), 100);
        assert_eq!(scalar_to_percent(1.7), 100);
        assert_eq!(scalar_to_percent(-0.2), 0);
    }

    #[test]
    fn percent_maps_back_to_core_audio_scalar() {
        assert_eq!(percent_to_scalar(0), 0.0);
        assert_eq!(percent_to_scalar(50), 0.5);
        assert_eq!(percent_to_scalar(100), 1.0);
        assert_eq!(percent_to_scalar(250), 1.0);
    }

    #[test]
    fn core_audio_step_clamps_like_other_backends() {
        let level = clamp_level(scalar_to_percent(0.95), 10);
        assert_eq!(level, 100);
        assert_eq!(percent_to_scalar(level), 1.0);
        let level = clamp_level(scalar_to_percent(0.3), -10);
        assert_eq!(percent_to_scalar(level), 0.2);
    }

    #[test]
    fn probe_always_yields_a_backend() {
        let v = probe();
        assert!(!v.backend_name().is_empty());
    }
}
