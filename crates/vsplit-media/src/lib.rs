#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for video segmentation.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Duration probing through FFprobe
//! - Stream-copy segmentation into fixed-length parts
//! - Single-frame thumbnail capture
//! - A [`MediaToolkit`] trait so callers can swap the external tool out

pub mod command;
pub mod error;
pub mod probe;
pub mod segment;
pub mod thumbnail;
pub mod toolkit;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::probe_duration;
pub use segment::split_into_segments;
pub use thumbnail::generate_thumbnail;
pub use toolkit::{FfmpegToolkit, MediaToolkit};
