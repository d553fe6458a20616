//! camwire - Camera/station wire protocol tool
//!
//! Encodes and decodes stream and command packets to and from files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use camwire::config::{self, Config};
use camwire::frame::{self, ImageCodec, JpegCodec};
use camwire::protocol::{self, limits, CameraStatus, CommandPacket, ResolutionTier, StreamPacket};

/// camwire - Camera/station wire protocol tool
#[derive(Parser)]
#[command(name = "camwire")]
#[command(author = "camwire Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Encode and inspect camera stream and command packets", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a stream packet from the configured camera
    StreamEncode {
        /// JPEG frame to embed (placeholder frame if omitted)
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Status bitmask (1 = low battery, 2 = discharging, 4 = flashlight failure, 8 = video failure)
        #[arg(short, long, default_value_t = 0)]
        status: u32,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Validate and print a stream packet
    StreamDecode {
        /// Encoded stream packet
        input: PathBuf,

        /// Write the embedded frame to this path
        #[arg(long)]
        save_frame: Option<PathBuf>,
    },

    /// Encode a command packet
    CommandEncode {
        /// Stream packet holding the camera's current state (config if omitted)
        #[arg(long)]
        stream: Option<PathBuf>,

        #[arg(long)]
        fps: Option<i32>,

        #[arg(long)]
        zoom: Option<i32>,

        /// Resolution tier index
        #[arg(long)]
        resolution: Option<i32>,

        #[arg(long)]
        flashlight: Option<bool>,

        #[arg(long)]
        auto_regulate: Option<bool>,

        /// Ask the camera to refocus
        #[arg(long)]
        focus: bool,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decode a command packet and show what changed
    CommandDecode {
        /// Encoded command packet
        input: PathBuf,
    },

    /// Render a placeholder frame to a JPEG file
    Placeholder {
        #[arg(short, long, default_value = frame::NO_IMAGE_TEXT)]
        text: String,

        #[arg(long, default_value_t = 640)]
        width: u32,

        #[arg(long, default_value_t = 480)]
        height: u32,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show current configuration
    Config {
        /// Generate sample configuration
        #[arg(long)]
        generate: bool,

        /// Output path for generated config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show protocol constants
    Info,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default().unwrap_or_default()
    };

    // Initialize logging
    let filter = if cli.verbose || config.general.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::StreamEncode {
            image,
            status,
            output,
        } => stream_encode(&config, image.as_deref(), status, &output)?,
        Commands::StreamDecode { input, save_frame } => {
            stream_decode(&input, save_frame.as_deref())?
        }
        Commands::CommandEncode {
            stream,
            fps,
            zoom,
            resolution,
            flashlight,
            auto_regulate,
            focus,
            output,
        } => {
            let mut command = match stream {
                Some(path) => {
                    let data = read(&path)?;
                    CommandPacket::from_stream(&StreamPacket::decode(&data)?)
                }
                None => CommandPacket::from_stream(&config.stream_packet()),
            };

            command.new_fps = fps.unwrap_or(command.new_fps);
            command.new_zoom = zoom.unwrap_or(command.new_zoom);
            command.new_resolution = resolution.unwrap_or(command.new_resolution);
            command.new_flashlight_enabled = flashlight.unwrap_or(command.new_flashlight_enabled);
            command.new_auto_regulate_resolution =
                auto_regulate.unwrap_or(command.new_auto_regulate_resolution);
            command.focus_request = focus;

            let data = command.encode()?;
            write(&output, &data)?;
            println!("Command packet written to: {} ({} bytes)", output.display(), data.len());
        }
        Commands::CommandDecode { input } => command_decode(&input)?,
        Commands::Placeholder {
            text,
            width,
            height,
            output,
        } => {
            anyhow::ensure!(width > 0 && height > 0, "placeholder size must be non-zero");
            let image = frame::placeholder(width, height, &text.replace("\\n", "\n"));
            let data = JpegCodec.compress(&image, 90)?;
            write(&output, &data)?;
            println!("Placeholder written to: {}", output.display());
        }
        Commands::Config { generate, output } => {
            if generate {
                let sample = config::generate_sample_config()?;
                if let Some(path) = output {
                    std::fs::write(&path, &sample)?;
                    println!("Configuration written to: {}", path.display());
                } else {
                    println!("{}", sample);
                }
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
        Commands::Info => print_protocol_info(),
    }

    Ok(())
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn write(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))
}

/// Encode the configured camera's current state
fn stream_encode(
    config: &Config,
    image: Option<&Path>,
    status: u32,
    output: &Path,
) -> anyhow::Result<()> {
    let mut packet = config.stream_packet();
    packet.status = CameraStatus::from_bits(status);

    if let Some(path) = image {
        packet.image = JpegCodec
            .decompress(&read(path)?)
            .with_context(|| format!("decoding {}", path.display()))?;
    }

    tracing::info!(
        "Encoding stream packet for '{}' ({}, {} fps)",
        packet.name,
        packet.resolution,
        packet.fps
    );

    let data = packet.encode()?;
    write(output, &data)?;
    println!("Stream packet written to: {} ({} bytes)", output.display(), data.len());

    Ok(())
}

/// Validate a stream packet and print its fields
fn stream_decode(input: &Path, save_frame: Option<&Path>) -> anyhow::Result<()> {
    let data = read(input)?;
    let packet = StreamPacket::decode(&data)?;

    println!("Stream packet ({} bytes, crc {:#010x})", data.len(), packet.crc32);
    println!("  Camera:      {} / {}", packet.name, packet.group);
    println!("  Status:      {}", packet.status_string());
    println!("  FPS:         {} (watchdog {} ms)", packet.fps, packet.watchdog_timeout());
    println!("  Zoom:        {} (supported: {})", packet.zoom, packet.zoom_supported);
    println!("  Resolution:  {}", packet.resolution);
    println!("  Auto-regulate resolution: {}", packet.auto_regulate_resolution);
    println!("  Flashlight:  {}", packet.flashlight_enabled);
    println!("  Frame:       {}x{}", packet.image.width(), packet.image.height());

    if let Some(path) = save_frame {
        let frame = JpegCodec.compress(&packet.image, 90)?;
        write(path, &frame)?;
        println!("Frame written to: {}", path.display());
    }

    Ok(())
}

/// Decode a command packet and print its pairs with change markers
fn command_decode(input: &Path) -> anyhow::Result<()> {
    let command = CommandPacket::decode(&read(input)?)?;
    let mark = |changed: bool| if changed { "*" } else { " " };
    let tier = |index: i32| {
        ResolutionTier::from_index(index)
            .map(|t| t.to_string())
            .unwrap_or_else(|| format!("invalid ({})", index))
    };

    println!("Command packet");
    println!(
        " {} FPS:         {} -> {} (effective {})",
        mark(command.changes.fps),
        command.old_fps,
        command.new_fps,
        command.effective_fps()
    );
    println!(
        " {} Zoom:        {} -> {}",
        mark(command.changes.zoom),
        command.old_zoom,
        command.new_zoom
    );
    println!(
        " {} Resolution:  {} -> {}",
        mark(command.changes.resolution),
        tier(command.old_resolution),
        tier(command.new_resolution)
    );
    println!(
        " {} Flashlight:  {} -> {}",
        mark(command.changes.flashlight_enabled),
        command.old_flashlight_enabled,
        command.new_flashlight_enabled
    );
    println!(
        " {} Auto-regulate resolution: {} -> {}",
        mark(command.changes.auto_regulate_resolution),
        command.old_auto_regulate_resolution,
        command.new_auto_regulate_resolution
    );
    println!("   Focus request: {}", command.focus_request);

    if !command.changes.any() {
        println!("No settings changed.");
    }

    Ok(())
}

/// Print protocol constants and the resolution table
fn print_protocol_info() {
    println!("camwire Protocol Information");
    println!("============================\n");

    println!("Record version: {}", protocol::PROTOCOL_VERSION);
    println!("Stream port:    {}", protocol::STREAM_PORT);
    println!("Command port:   {}", protocol::COMMAND_PORT);
    println!("FPS range:      {}..={}", limits::MIN_FPS, limits::MAX_FPS);
    println!(
        "Watchdog:       {}..={} ms (fps * 50)",
        limits::MIN_WATCHDOG_MS,
        limits::MAX_WATCHDOG_MS
    );

    println!("\nResolutions:");
    for tier in ResolutionTier::ALL {
        println!(
            "  {}  {:<16} quality {}",
            tier.index(),
            tier.label(),
            frame::quality_for(tier)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["camwire", "info"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_command_encode_args() {
        let cli = Cli::try_parse_from([
            "camwire",
            "command-encode",
            "--fps",
            "24",
            "--flashlight",
            "true",
            "-o",
            "cmd.bin",
        ])
        .unwrap();

        match cli.command {
            Commands::CommandEncode {
                fps, flashlight, focus, ..
            } => {
                assert_eq!(fps, Some(24));
                assert_eq!(flashlight, Some(true));
                assert!(!focus);
            }
            _ => panic!("Wrong subcommand"),
        }
    }

    #[test]
    fn test_stream_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let packet_path = dir.path().join("stream.bin");
        let frame_path = dir.path().join("frame.jpg");

        let mut config = Config::default();
        config.camera.resolution = ResolutionTier::Qcif.index();
        stream_encode(&config, None, CameraStatus::VIDEO_FAILURE.bits(), &packet_path).unwrap();
        stream_decode(&packet_path, Some(&frame_path)).unwrap();

        let frame = JpegCodec.decompress(&std::fs::read(&frame_path).unwrap()).unwrap();
        assert_eq!(frame.dimensions(), (176, 132));
    }
}
