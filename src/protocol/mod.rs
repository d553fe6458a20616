//! Protocol module - Defines the wire protocol between cameras and stations
//!
//! Two packet kinds travel over the wire:
//! - Stream packets (camera -> station): 4 bytes CRC-32 (big-endian) followed
//!   by a JSON record carrying settings, status and a base-64 JPEG frame
//! - Command packets (station -> camera): a bare JSON record of old/new value
//!   pairs, from which the receiver derives per-field "changed" flags

pub mod checksum;
mod codec;
pub mod limits;
mod message;

pub use codec::*;
pub use limits::{clamp_fps, dimensions_for, watchdog_timeout};
pub use message::*;

/// Record layout version written under the `v` key of every record
pub const PROTOCOL_VERSION: u32 = 1;

/// Port on which stations listen for stream packets
pub const STREAM_PORT: u16 = 1100;

/// Port on which cameras listen for command packets
pub const COMMAND_PORT: u16 = 1150;

/// Size of the checksum prefix on stream packets
pub const CHECKSUM_SIZE: usize = 4;
