//! Database repositories
//!
//! The upload pipeline only needs to read a video record and write it back, so the
//! repository is a narrow trait with a PostgreSQL implementation.

mod video;

pub use video::{PgVideoRepository, VideoRepository};
