//! Encoder invocation assembly
//!
//! A [`CommandBuilder`] turns a [`DeviceCatalog`] into the full argument vector
//! of a recording run. Arguments are kept discrete so device names containing
//! spaces or quotes reach the encoder untouched.

pub mod avfoundation;
pub mod directshow;

use std::path::Path;

use crate::devices::DeviceCatalog;

pub use avfoundation::AvFoundationCommandBuilder;
pub use directshow::DirectShowCommandBuilder;

/// Global options placed right after the encoder binary
pub const GLOBAL_ARGS: [&str; 5] = ["-y", "-loglevel", "info", "-rtbufsize", "2000M"];

/// Codec and quality block, identical on every platform (order matters)
pub const CODEC_ARGS: [&str; 18] = [
    "-vcodec",
    "libx264",
    "-pix_fmt",
    "yuv420p",
    "-preset",
    "ultrafast",
    "-bufsize",
    "600k",
    "-threads",
    "0",
    "-crf",
    "0",
    "-tune",
    "zerolatency",
    "-vsync",
    "vfr",
    "-acodec",
    "libmp3lame",
];

/// Output container, followed by the output path
pub const CONTAINER_ARGS: [&str; 2] = ["-f", "mp4"];

/// Builds the recording invocation for one capture backend
pub trait CommandBuilder: Send + Sync {
    /// Full argument vector, encoder binary first
    fn build(&self, catalog: &DeviceCatalog, encoder: &Path, output: &Path, fps: u32) -> Vec<String>;
}

/// Shared layout: binary, global options, inputs, codec block, container, output path
fn assemble(encoder: &Path, inputs: Vec<String>, output: &Path) -> Vec<String> {
    let mut args = Vec::with_capacity(
        1 + GLOBAL_ARGS.len() + inputs.len() + CODEC_ARGS.len() + CONTAINER_ARGS.len() + 1,
    );
    args.push(encoder.display().to_string());
    args.extend(GLOBAL_ARGS.iter().map(|a| a.to_string()));
    args.extend(inputs);
    args.extend(CODEC_ARGS.iter().map(|a| a.to_string()));
    args.extend(CONTAINER_ARGS.iter().map(|a| a.to_string()));
    args.push(output.display().to_string());
    args
}

/// Mixes every audio input into one track
fn mix_clause(inputs: usize) -> [String; 2] {
    ["-filter_complex".to_string(), format!("amix=inputs={}", inputs)]
}
