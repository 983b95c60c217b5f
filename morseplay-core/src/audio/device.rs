//! Audio device enumeration and selection, for both playback and capture.

use serde::{Deserialize, Serialize};

/// Metadata about an audio device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Human-readable device name reported by the OS.
    pub name: String,
    /// Whether this is the system default device for its direction.
    pub is_default: bool,
}

/// Order devices for display: default first, then case-insensitive by name.
pub fn sort_devices(devices: &mut [DeviceInfo]) {
    devices.sort_by_key(|d| (!d.is_default, d.name.to_ascii_lowercase()));
}

/// Whether `name` matches a user-supplied preference.
///
/// Comparison ignores surrounding whitespace and ASCII case.
pub fn matches_preference(name: &str, preferred: &str) -> bool {
    name.trim().eq_ignore_ascii_case(preferred.trim())
}

/// Which side of the audio host a device is enumerated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    #[cfg_attr(not(feature = "audio-cpal"), allow(dead_code))]
    fn label(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// List all available audio output devices on the system.
///
/// Returns an empty `Vec` if cpal is not available or no devices exist.
pub fn list_output_devices() -> Vec<DeviceInfo> {
    list_devices(Direction::Output)
}

/// List all available audio input (recording) devices on the system.
pub fn list_input_devices() -> Vec<DeviceInfo> {
    list_devices(Direction::Input)
}

#[cfg(feature = "audio-cpal")]
type DeviceIter = Box<dyn Iterator<Item = cpal::Device>>;

#[cfg(feature = "audio-cpal")]
fn host_devices(
    host: &cpal::Host,
    direction: Direction,
) -> std::result::Result<DeviceIter, cpal::DevicesError> {
    use cpal::traits::HostTrait;

    Ok(match direction {
        Direction::Input => Box::new(host.input_devices()?),
        Direction::Output => Box::new(host.output_devices()?),
    })
}

#[cfg(feature = "audio-cpal")]
fn default_device(host: &cpal::Host, direction: Direction) -> Option<cpal::Device> {
    use cpal::traits::HostTrait;

    match direction {
        Direction::Input => host.default_input_device(),
        Direction::Output => host.default_output_device(),
    }
}

#[cfg(feature = "audio-cpal")]
fn list_devices(direction: Direction) -> Vec<DeviceInfo> {
    use cpal::traits::DeviceTrait;

    let host = cpal::default_host();
    let default_name = default_device(&host, direction).and_then(|d| d.name().ok());

    match host_devices(&host, direction) {
        Ok(devices) => {
            let mut list = devices
                .enumerate()
                .map(|(idx, device)| {
                    let name = device.name().unwrap_or_else(|_| {
                        format!("{} device {}", direction.label(), idx + 1)
                    });
                    let is_default = default_name.as_deref() == Some(name.as_str());
                    DeviceInfo { name, is_default }
                })
                .collect::<Vec<_>>();
            sort_devices(&mut list);
            list
        }
        Err(e) => {
            tracing::warn!("failed to enumerate {} devices: {e}", direction.label());
            match default_name {
                Some(name) => vec![DeviceInfo {
                    name,
                    is_default: true,
                }],
                None => vec![],
            }
        }
    }
}

#[cfg(not(feature = "audio-cpal"))]
fn list_devices(_direction: Direction) -> Vec<DeviceInfo> {
    vec![]
}

/// Pick the preferred device by name, otherwise the default device, otherwise
/// the first available one. The error string is folded into the caller's
/// error variant.
#[cfg(feature = "audio-cpal")]
pub(crate) fn select_device(
    host: &cpal::Host,
    direction: Direction,
    preferred: Option<&str>,
) -> std::result::Result<cpal::Device, String> {
    use cpal::traits::DeviceTrait;

    let label = direction.label();
    if let Some(preferred_name) = preferred {
        match host_devices(host, direction) {
            Ok(mut devices) => {
                let found = devices.find(|device| {
                    device
                        .name()
                        .map(|name| matches_preference(&name, preferred_name))
                        .unwrap_or(false)
                });
                if let Some(device) = found {
                    return Ok(device);
                }
                tracing::warn!(
                    "preferred {label} device '{}' not found, falling back",
                    preferred_name
                );
            }
            Err(e) => {
                tracing::warn!("failed to list {label} devices while resolving preference: {e}");
            }
        }
    }

    if let Some(default) = default_device(host, direction) {
        return Ok(default);
    }

    let mut devices = host_devices(host, direction).map_err(|e| e.to_string())?;
    let fallback = devices
        .next()
        .ok_or_else(|| format!("no {label} device found"))?;
    tracing::warn!("no default {label} device, falling back to first available {label}");
    Ok(fallback)
}
