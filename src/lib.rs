//! camwire - Camera/station wire protocol
//!
//! Encodes camera stream reports into checksummed packets carrying a JPEG
//! frame, and station commands into old/new value pairs from which the camera
//! derives what changed.

pub mod config;
pub mod frame;
pub mod protocol;

pub use frame::{ImageCodec, JpegCodec};
pub use protocol::{
    CameraStatus, Changes, CodecError, CodecResult, CommandPacket, ResolutionTier, StreamPacket,
};
