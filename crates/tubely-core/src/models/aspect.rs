use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Coarse orientation of a video, used as the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    Landscape,
    Portrait,
    Other,
}

impl AspectRatio {
    /// Classify pixel dimensions as 16:9, 9:16 or anything else.
    ///
    /// Uses truncating integer division on purpose: `w == 16 * h / 9` is the
    /// landscape test and `h == 16 * w / 9` the portrait one, so near-16:9
    /// sizes such as 1918x1080 classify as `Other`. Stored keys depend on this.
    pub fn classify(width: u32, height: u32) -> Self {
        let (w, h) = (u64::from(width), u64::from(height));
        if w == 16 * h / 9 {
            AspectRatio::Landscape
        } else if h == 16 * w / 9 {
            AspectRatio::Portrait
        } else {
            AspectRatio::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Other => "other",
        }
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_common_sizes() {
        assert_eq!(AspectRatio::classify(1920, 1080), AspectRatio::Landscape);
        assert_eq!(AspectRatio::classify(1280, 720), AspectRatio::Landscape);
        assert_eq!(AspectRatio::classify(1080, 1920), AspectRatio::Portrait);
        assert_eq!(AspectRatio::classify(720, 1280), AspectRatio::Portrait);
        assert_eq!(AspectRatio::classify(1000, 1000), AspectRatio::Other);
        assert_eq!(AspectRatio::classify(640, 480), AspectRatio::Other);
    }

    #[test]
    fn test_classify_truncating_division() {
        // 16 * 1080 / 9 = 1920 exactly, so one pixel off misses
        assert_eq!(AspectRatio::classify(1918, 1080), AspectRatio::Other);
        // 16 * 100 / 9 = 177 (truncated)
        assert_eq!(AspectRatio::classify(177, 100), AspectRatio::Landscape);
        assert_eq!(AspectRatio::classify(178, 100), AspectRatio::Other);
        assert_eq!(AspectRatio::classify(100, 177), AspectRatio::Portrait);
    }

    #[test]
    fn test_classify_zero_dimensions() {
        assert_eq!(AspectRatio::classify(0, 0), AspectRatio::Landscape);
        assert_eq!(AspectRatio::classify(0, 10), AspectRatio::Other);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let first = AspectRatio::classify(3840, 2160);
        for _ in 0..10 {
            assert_eq!(AspectRatio::classify(3840, 2160), first);
        }
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(AspectRatio::Portrait.to_string(), "portrait");
        assert_eq!(
            serde_json::to_string(&AspectRatio::Landscape).unwrap(),
            "\"landscape\""
        );
    }
}
