//! Storage key generation shared by every backend and by the thumbnail writer.
//!
//! Uniqueness is probabilistic: 256 random bits per key, no existence check.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::RngCore;
use tubely_core::AspectRatio;

const RANDOM_ID_BYTES: usize = 32;

/// 32 bytes from the thread-local CSPRNG, URL-safe base64 with padding.
pub fn random_id() -> String {
    let mut bytes = [0u8; RANDOM_ID_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}

/// `{aspect}/{id}.{ext}`
pub fn video_storage_key(aspect: AspectRatio, extension: &str) -> String {
    format!("{}/{}", aspect, asset_file_name(extension))
}

/// `{id}.{ext}`, used for thumbnails written under the assets root.
pub fn asset_file_name(extension: &str) -> String {
    format!("{}.{}", random_id(), extension)
}
