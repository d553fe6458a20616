//! Protocol codec for encoding/decoding packets
//!
//! Both packet kinds serialize to a JSON record with fixed key names. Stream
//! packets additionally carry a 4-byte big-endian CRC-32 of that record in
//! front of it. Command packets are small control-plane messages and are sent
//! without a checksum, relying on the transport for integrity.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{checksum, CameraStatus, CommandPacket, ResolutionTier, StreamPacket};
use super::{CHECKSUM_SIZE, PROTOCOL_VERSION};
use crate::frame::{self, FrameError, ImageCodec, JpegCodec};

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Truncated packet: {len} bytes (min: {min})")]
    Truncated { len: usize, min: usize },

    #[error("Checksum mismatch: declared {declared:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { declared: u32, computed: u32 },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Wire record of a stream packet
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StreamRecord {
    #[serde(rename = "v", deserialize_with = "lenient::version")]
    version: u32,
    #[serde(deserialize_with = "lenient::int")]
    fps: i32,
    #[serde(deserialize_with = "lenient::int")]
    zoom: i32,
    #[serde(deserialize_with = "lenient::string")]
    name: String,
    #[serde(deserialize_with = "lenient::string")]
    group: String,
    #[serde(deserialize_with = "lenient::int")]
    status: i32,
    #[serde(deserialize_with = "lenient::int")]
    resolution: i32,
    #[serde(rename = "zoomSupported", deserialize_with = "lenient::boolean")]
    zoom_supported: bool,
    #[serde(deserialize_with = "lenient::boolean")]
    flashlight: bool,
    #[serde(rename = "autoRegulateResolution", deserialize_with = "lenient::boolean")]
    auto_regulate_resolution: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_string"
    )]
    image: Option<String>,
}

/// Wire record of a command packet
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CommandRecord {
    #[serde(rename = "v", deserialize_with = "lenient::version")]
    version: u32,
    #[serde(deserialize_with = "lenient::int")]
    o_fps: i32,
    #[serde(deserialize_with = "lenient::int")]
    n_fps: i32,
    #[serde(deserialize_with = "lenient::int")]
    o_zoom: i32,
    #[serde(deserialize_with = "lenient::int")]
    n_zoom: i32,
    #[serde(deserialize_with = "lenient::boolean")]
    focus: bool,
    #[serde(deserialize_with = "lenient::int")]
    o_res: i32,
    #[serde(deserialize_with = "lenient::int")]
    n_res: i32,
    #[serde(deserialize_with = "lenient::boolean")]
    o_flashlight: bool,
    #[serde(deserialize_with = "lenient::boolean")]
    n_flashlight: bool,
    #[serde(rename = "o_autoRegulateResolution", deserialize_with = "lenient::boolean")]
    o_auto_regulate_resolution: bool,
    #[serde(rename = "n_autoRegulateResolution", deserialize_with = "lenient::boolean")]
    n_auto_regulate_resolution: bool,
}

/// Field readers that never fail on a value of the wrong type or range
///
/// A value that cannot be represented reads as the type's default (0, false,
/// empty string), so only the shape of the record can make it malformed.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            _ => None,
        }
    }

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(to_i64(&value)
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or_default())
    }

    pub fn version<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(to_i64(&value)
            .map(|n| n.clamp(0, u32::MAX as i64) as u32)
            .unwrap_or_default())
    }

    pub fn boolean<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_bool().unwrap_or_default())
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(optional_string(deserializer)?.unwrap_or_default())
    }

    pub fn optional_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Some(s)),
            _ => Ok(None),
        }
    }
}

/// Parse a record, rejecting anything that is not a non-empty JSON object
fn parse_record<T: DeserializeOwned>(data: &[u8]) -> CodecResult<T> {
    let value: serde_json::Value =
        serde_json::from_slice(data).map_err(|e| CodecError::MalformedRecord(e.to_string()))?;

    match value {
        serde_json::Value::Object(map) if !map.is_empty() => {
            serde_json::from_value(serde_json::Value::Object(map))
                .map_err(|e| CodecError::MalformedRecord(e.to_string()))
        }
        serde_json::Value::Object(_) => Err(CodecError::MalformedRecord("empty record".into())),
        _ => Err(CodecError::MalformedRecord("record is not an object".into())),
    }
}

fn check_version(version: u32) -> CodecResult<()> {
    if version > PROTOCOL_VERSION {
        return Err(CodecError::MalformedRecord(format!(
            "unsupported record version {} (max: {})",
            version, PROTOCOL_VERSION
        )));
    }
    Ok(())
}

impl StreamPacket {
    /// Encode into the checksum-prefixed wire format using JPEG frames
    pub fn encode(&self) -> CodecResult<Bytes> {
        self.encode_with(&JpegCodec)
    }

    /// Encode into the checksum-prefixed wire format
    pub fn encode_with<C>(&self, codec: &C) -> CodecResult<Bytes>
    where
        C: ImageCodec + ?Sized,
    {
        let image = frame::compress(codec, &self.image, self.resolution)?;

        let record = StreamRecord {
            version: PROTOCOL_VERSION,
            fps: self.fps,
            zoom: self.zoom,
            name: self.name.clone(),
            group: self.group.clone(),
            status: self.status.bits() as i32,
            resolution: self.resolution.index(),
            zoom_supported: self.zoom_supported,
            flashlight: self.flashlight_enabled,
            auto_regulate_resolution: self.auto_regulate_resolution,
            image: (!image.is_empty()).then(|| BASE64.encode(&image)),
        };

        let payload = serde_json::to_vec(&record)?;
        let crc = checksum::compute(&payload);

        let mut buf = BytesMut::with_capacity(CHECKSUM_SIZE + payload.len());
        buf.put_slice(&checksum::to_prefix(crc));
        buf.put_slice(&payload);

        tracing::debug!(
            camera = %self.name,
            bytes = buf.len(),
            image_bytes = image.len(),
            crc = %format_args!("{:#010x}", crc),
            "encoded stream packet"
        );

        Ok(buf.freeze())
    }

    /// Decode and validate a stream packet using JPEG frames
    pub fn decode(data: &[u8]) -> CodecResult<Self> {
        Self::decode_with(&JpegCodec, data)
    }

    /// Decode and validate a stream packet
    ///
    /// The checksum is verified before anything else is parsed, and a packet
    /// is only returned when its embedded frame decodes to a usable image.
    pub fn decode_with<C>(codec: &C, data: &[u8]) -> CodecResult<Self>
    where
        C: ImageCodec + ?Sized,
    {
        let declared = checksum::from_prefix(data).ok_or(CodecError::Truncated {
            len: data.len(),
            min: CHECKSUM_SIZE,
        })?;

        let payload = &data[CHECKSUM_SIZE..];
        let computed = checksum::compute(payload);
        if declared != computed {
            tracing::warn!(
                declared = %hex::encode(declared.to_be_bytes()),
                computed = %hex::encode(computed.to_be_bytes()),
                "stream packet with invalid checksum"
            );
            return Err(CodecError::ChecksumMismatch { declared, computed });
        }

        let record: StreamRecord = parse_record(payload)?;
        check_version(record.version)?;

        // The frame arrives already scaled, so an unknown tier only loses the label
        let resolution = ResolutionTier::from_index(record.resolution).unwrap_or_else(|| {
            tracing::warn!(
                resolution = record.resolution,
                "stream packet with unknown resolution, treating as original"
            );
            ResolutionTier::Original
        });

        let encoded = record
            .image
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CodecError::InvalidImage("no image in record".into()))?;
        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| CodecError::InvalidImage(e.to_string()))?;
        let image =
            frame::decompress(codec, &bytes).map_err(|e| CodecError::InvalidImage(e.to_string()))?;

        tracing::debug!(
            camera = %record.name,
            bytes = data.len(),
            width = image.width(),
            height = image.height(),
            "decoded stream packet"
        );

        Ok(Self {
            crc32: declared,
            fps: record.fps,
            zoom: record.zoom,
            zoom_supported: record.zoom_supported,
            name: record.name,
            group: record.group,
            flashlight_enabled: record.flashlight,
            resolution,
            auto_regulate_resolution: record.auto_regulate_resolution,
            status: CameraStatus::from_bits(record.status as u32),
            image,
        })
    }
}

impl CommandPacket {
    /// Encode into the wire format; change flags are not transmitted
    pub fn encode(&self) -> CodecResult<Bytes> {
        let record = CommandRecord {
            version: PROTOCOL_VERSION,
            o_fps: self.old_fps,
            n_fps: self.new_fps,
            o_zoom: self.old_zoom,
            n_zoom: self.new_zoom,
            focus: self.focus_request,
            o_res: self.old_resolution,
            n_res: self.new_resolution,
            o_flashlight: self.old_flashlight_enabled,
            n_flashlight: self.new_flashlight_enabled,
            o_auto_regulate_resolution: self.old_auto_regulate_resolution,
            n_auto_regulate_resolution: self.new_auto_regulate_resolution,
        };

        let payload = serde_json::to_vec(&record)?;
        tracing::debug!(bytes = payload.len(), "encoded command packet");
        Ok(Bytes::from(payload))
    }

    /// Decode a command packet and derive its change flags
    ///
    /// Values are accepted as-is; range checks are left to the camera.
    pub fn decode(data: &[u8]) -> CodecResult<Self> {
        if data.is_empty() {
            return Err(CodecError::Truncated { len: 0, min: 1 });
        }

        let record: CommandRecord = parse_record(data)?;
        check_version(record.version)?;

        let mut packet = Self {
            old_fps: record.o_fps,
            new_fps: record.n_fps,
            old_zoom: record.o_zoom,
            new_zoom: record.n_zoom,
            old_resolution: record.o_res,
            new_resolution: record.n_res,
            old_flashlight_enabled: record.o_flashlight,
            new_flashlight_enabled: record.n_flashlight,
            old_auto_regulate_resolution: record.o_auto_regulate_resolution,
            new_auto_regulate_resolution: record.n_auto_regulate_resolution,
            focus_request: record.focus,
            changes: Default::default(),
        };
        packet.detect_changes();

        tracing::debug!(changes = ?packet.changes, focus = packet.focus_request, "decoded command packet");
        Ok(packet)
    }
}
