//! Protocol message definitions
//!
//! Defines the stream and command packets exchanged between cameras and
//! stations, along with the resolution tiers and status flags they carry.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::limits::{clamp_fps, watchdog_timeout, DEFAULT_FPS};
use crate::frame;

/// Resolution presets used for both frame scaling and JPEG quality selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResolutionTier {
    Qcif = 0,
    Cif = 1,
    TwoCif = 2,
    FourCif = 3,
    D1 = 4,
    Hd720 = 5,
    Hd960 = 6,
    /// Keep the source frame size
    #[default]
    Original = 7,
}

impl ResolutionTier {
    /// All tiers in wire index order
    pub const ALL: [ResolutionTier; 8] = [
        ResolutionTier::Qcif,
        ResolutionTier::Cif,
        ResolutionTier::TwoCif,
        ResolutionTier::FourCif,
        ResolutionTier::D1,
        ResolutionTier::Hd720,
        ResolutionTier::Hd960,
        ResolutionTier::Original,
    ];

    /// Wire index of this tier
    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Label shown in station resolution pickers
    pub fn label(self) -> &'static str {
        match self {
            ResolutionTier::Qcif => "QCIF (176x144)",
            ResolutionTier::Cif => "CIF (352x240)",
            ResolutionTier::TwoCif => "2CIF (704x240)",
            ResolutionTier::FourCif => "4CIF (704x480)",
            ResolutionTier::D1 => "D1 (720x480)",
            ResolutionTier::Hd720 => "720p (1280x720)",
            ResolutionTier::Hd960 => "960p (1280x960)",
            ResolutionTier::Original => "Original",
        }
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Camera status bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraStatus(u32);

impl CameraStatus {
    pub const OK: CameraStatus = CameraStatus(0);
    pub const LOW_BATTERY: CameraStatus = CameraStatus(1 << 0);
    pub const DISCHARGING: CameraStatus = CameraStatus(1 << 1);
    pub const FLASHLIGHT_FAILURE: CameraStatus = CameraStatus(1 << 2);
    pub const VIDEO_FAILURE: CameraStatus = CameraStatus(1 << 3);

    /// Flags in declaration order, paired with their display names
    const NAMED: [(CameraStatus, &'static str); 4] = [
        (CameraStatus::LOW_BATTERY, "Low Battery"),
        (CameraStatus::DISCHARGING, "Discharging"),
        (CameraStatus::FLASHLIGHT_FAILURE, "Flashlight Failure"),
        (CameraStatus::VIDEO_FAILURE, "Video Failure"),
    ];

    /// Unknown bits are kept
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_ok(&self) -> bool {
        self.0 == Self::OK.0
    }

    pub fn contains(&self, other: CameraStatus) -> bool {
        other.0 != 0 && (self.0 & other.0) == other.0
    }

    pub fn insert(&mut self, other: CameraStatus) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: CameraStatus) {
        self.0 &= !other.0;
    }

    /// Human readable summary: active flag names joined by `" | "`, or
    /// `"Camera OK"` when no flag is set
    pub fn describe(&self) -> String {
        if self.is_ok() {
            return "Camera OK".to_string();
        }

        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl BitOr for CameraStatus {
    type Output = CameraStatus;

    fn bitor(self, rhs: Self) -> Self::Output {
        CameraStatus(self.0 | rhs.0)
    }
}

impl BitOrAssign for CameraStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

impl fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Periodic report sent from a camera to a station
#[derive(Debug, Clone, PartialEq)]
pub struct StreamPacket {
    /// Checksum read from the wire; only meaningful on decoded packets
    pub crc32: u32,
    pub fps: i32,
    pub zoom: i32,
    pub zoom_supported: bool,
    pub name: String,
    pub group: String,
    pub flashlight_enabled: bool,
    pub resolution: ResolutionTier,
    pub auto_regulate_resolution: bool,
    pub status: CameraStatus,
    /// Raw frame; compressed on encode according to `resolution`
    pub image: RgbImage,
}

impl Default for StreamPacket {
    fn default() -> Self {
        Self {
            crc32: 0,
            fps: DEFAULT_FPS,
            zoom: 0,
            zoom_supported: false,
            name: "Unknown".to_string(),
            group: "Default".to_string(),
            flashlight_enabled: false,
            resolution: ResolutionTier::Original,
            auto_regulate_resolution: true,
            status: CameraStatus::OK,
            image: frame::placeholder(640, 480, frame::NO_IMAGE_TEXT),
        }
    }
}

impl StreamPacket {
    pub fn status_string(&self) -> String {
        self.status.describe()
    }

    /// Watchdog timeout a station should apply to this camera
    pub fn watchdog_timeout(&self) -> u32 {
        watchdog_timeout(self.fps)
    }
}

/// Per-field change flags, derived on decode and never transmitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Changes {
    pub fps: bool,
    pub zoom: bool,
    pub resolution: bool,
    pub flashlight_enabled: bool,
    pub auto_regulate_resolution: bool,
}

impl Changes {
    pub fn any(&self) -> bool {
        self.fps
            || self.zoom
            || self.resolution
            || self.flashlight_enabled
            || self.auto_regulate_resolution
    }
}

/// Configuration request sent from a station to a camera
///
/// Every mutable setting travels as an (old, new) pair so the camera can tell
/// what the operator actually changed without caching prior state.
/// Resolutions are kept as raw wire indices: out-of-range values are accepted
/// and left for the camera to reject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPacket {
    pub old_fps: i32,
    pub new_fps: i32,
    pub old_zoom: i32,
    pub new_zoom: i32,
    pub old_resolution: i32,
    pub new_resolution: i32,
    pub old_flashlight_enabled: bool,
    pub new_flashlight_enabled: bool,
    pub old_auto_regulate_resolution: bool,
    pub new_auto_regulate_resolution: bool,
    /// Stateless trigger, not part of the old/new diffing
    pub focus_request: bool,
    /// Populated by decode only
    pub changes: Changes,
}

impl CommandPacket {
    /// Seed both sides of every pair from the camera's last known state
    pub fn from_stream(stream: &StreamPacket) -> Self {
        let resolution = stream.resolution.index();
        Self {
            old_fps: stream.fps,
            new_fps: stream.fps,
            old_zoom: stream.zoom,
            new_zoom: stream.zoom,
            old_resolution: resolution,
            new_resolution: resolution,
            old_flashlight_enabled: stream.flashlight_enabled,
            new_flashlight_enabled: stream.flashlight_enabled,
            old_auto_regulate_resolution: stream.auto_regulate_resolution,
            new_auto_regulate_resolution: stream.auto_regulate_resolution,
            focus_request: false,
            changes: Changes::default(),
        }
    }

    pub fn old_resolution_tier(&self) -> Option<ResolutionTier> {
        ResolutionTier::from_index(self.old_resolution)
    }

    pub fn new_resolution_tier(&self) -> Option<ResolutionTier> {
        ResolutionTier::from_index(self.new_resolution)
    }

    /// Requested frame rate, clamped into the protocol range
    pub fn effective_fps(&self) -> i32 {
        clamp_fps(self.new_fps)
    }

    /// Recompute the change flags from the old/new pairs
    pub(crate) fn detect_changes(&mut self) {
        self.changes = Changes {
            fps: self.old_fps != self.new_fps,
            zoom: self.old_zoom != self.new_zoom,
            resolution: self.old_resolution != self.new_resolution,
            flashlight_enabled: self.old_flashlight_enabled != self.new_flashlight_enabled,
            auto_regulate_resolution: self.old_auto_regulate_resolution
                != self.new_auto_regulate_resolution,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(CameraStatus::OK.describe(), "Camera OK");
        assert_eq!(CameraStatus::LOW_BATTERY.describe(), "Low Battery");
        assert_eq!(
            (CameraStatus::VIDEO_FAILURE | CameraStatus::LOW_BATTERY).describe(),
            "Low Battery | Video Failure"
        );
        assert_eq!(
            CameraStatus::from_bits(0b1111).describe(),
            "Low Battery | Discharging | Flashlight Failure | Video Failure"
        );
    }

    #[test]
    fn test_status_bits() {
        let mut status = CameraStatus::default();
        assert!(status.is_ok());

        status |= CameraStatus::DISCHARGING;
        status.insert(CameraStatus::FLASHLIGHT_FAILURE);
        assert_eq!(status.bits(), 0b0110);
        assert!(status.contains(CameraStatus::DISCHARGING));
        assert!(!status.contains(CameraStatus::OK));

        status.remove(CameraStatus::DISCHARGING);
        assert_eq!(status, CameraStatus::FLASHLIGHT_FAILURE);
    }

    #[test]
    fn test_resolution_indices() {
        for (i, tier) in ResolutionTier::ALL.iter().enumerate() {
            assert_eq!(tier.index(), i as i32);
            assert_eq!(ResolutionTier::from_index(i as i32), Some(*tier));
        }
        assert_eq!(ResolutionTier::from_index(-1), None);
        assert_eq!(ResolutionTier::from_index(8), None);
        assert_eq!(ResolutionTier::Cif.to_string(), "CIF (352x240)");
    }

    #[test]
    fn test_stream_defaults() {
        let packet = StreamPacket::default();
        assert_eq!(packet.fps, 18);
        assert_eq!(packet.zoom, 0);
        assert_eq!(packet.name, "Unknown");
        assert_eq!(packet.group, "Default");
        assert_eq!(packet.resolution, ResolutionTier::Original);
        assert!(packet.auto_regulate_resolution);
        assert_eq!(packet.status_string(), "Camera OK");
        assert_eq!(packet.image.dimensions(), (640, 480));
        assert_eq!(packet.watchdog_timeout(), 900);
    }

    #[test]
    fn test_command_seeded_from_stream() {
        let stream = StreamPacket {
            fps: 24,
            zoom: 3,
            resolution: ResolutionTier::D1,
            flashlight_enabled: true,
            ..Default::default()
        };

        let command = CommandPacket::from_stream(&stream);
        assert_eq!(command.old_fps, 24);
        assert_eq!(command.new_fps, 24);
        assert_eq!(command.old_zoom, 3);
        assert_eq!(command.new_resolution_tier(), Some(ResolutionTier::D1));
        assert!(command.new_flashlight_enabled);
        assert!(command.new_auto_regulate_resolution);
        assert!(!command.focus_request);
        assert!(!command.changes.any());
    }

    #[test]
    fn test_effective_fps_is_clamped() {
        let command = CommandPacket {
            new_fps: 500,
            ..Default::default()
        };
        assert_eq!(command.effective_fps(), 30);
    }
}
