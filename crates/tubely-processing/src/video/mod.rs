//! External media tools: geometry probing and faststart remuxing.

mod probe;
mod remux;
mod tool;

pub use probe::{parse_probe_output, FfprobeProber, VideoDimensions, VideoProber};
pub use remux::{remux_output_path, FfmpegRemuxer, Remuxer};
pub use tool::MediaToolError;
