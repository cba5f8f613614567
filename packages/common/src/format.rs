//! Recording output formats
//!
//! The recorder is asked for a codec-specific encoding, while the finished
//! artifact carries only the container type.

pub const DEFAULT_MIME_CANDIDATES: [&str; 3] = [
    "video/webm;codecs=vp9",
    "video/webm;codecs=vp8",
    "video/webm",
];

/// Negotiated output format for one recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingFormat {
    /// MIME type handed to the recorder (e.g., "video/webm;codecs=vp9")
    pub encoding: String,

    /// MIME type of the finished artifact (e.g., "video/webm")
    pub container: String,

    /// File extension for downloads (e.g., "webm")
    pub extension: String,
}

impl RecordingFormat {
    pub fn from_encoding(encoding: &str) -> Self {
        let container = container_of(encoding);
        let extension = extension_of(&container);
        Self {
            encoding: encoding.trim().to_string(),
            container,
            extension,
        }
    }

    /// Pick the first candidate the platform accepts. Falls back to the first
    /// candidate so the platform reports the failure itself.
    pub fn negotiate<S, F>(candidates: &[S], is_supported: F) -> Self
    where
        S: AsRef<str>,
        F: Fn(&str) -> bool,
    {
        let chosen = candidates
            .iter()
            .map(|candidate| candidate.as_ref())
            .find(|mime| is_supported(mime))
            .or_else(|| candidates.first().map(|candidate| candidate.as_ref()))
            .unwrap_or(DEFAULT_MIME_CANDIDATES[0]);

        if !is_supported(chosen) {
            log::warn!("no supported recording mime type, requesting {}", chosen);
        }

        Self::from_encoding(chosen)
    }
}

impl Default for RecordingFormat {
    fn default() -> Self {
        Self::from_encoding(DEFAULT_MIME_CANDIDATES[0])
    }
}

/// Strip codec parameters: "video/webm;codecs=vp9" -> "video/webm"
pub fn container_of(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or(mime)
        .trim()
        .to_ascii_lowercase()
}

fn extension_of(container: &str) -> String {
    let subtype = container.rsplit('/').next().unwrap_or(container);
    match subtype {
        "x-matroska" => "mkv".to_string(),
        "quicktime" => "mov".to_string(),
        "" => "bin".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_vp9_in_generic_webm() {
        let format = RecordingFormat::default();
        assert_eq!(format.encoding, "video/webm;codecs=vp9");
        assert_eq!(format.container, "video/webm");
        assert_eq!(format.extension, "webm");
    }

    #[test]
    fn test_negotiate_picks_first_supported() {
        let format = RecordingFormat::negotiate(&DEFAULT_MIME_CANDIDATES, |mime| {
            mime == "video/webm;codecs=vp8" || mime == "video/webm"
        });
        assert_eq!(format.encoding, "video/webm;codecs=vp8");
        assert_eq!(format.container, "video/webm");
    }

    #[test]
    fn test_negotiate_falls_back_to_first_candidate() {
        let candidates = vec!["video/mp4;codecs=avc1".to_string()];
        let format = RecordingFormat::negotiate(&candidates, |_| false);
        assert_eq!(format.encoding, "video/mp4;codecs=avc1");
        assert_eq!(format.container, "video/mp4");
        assert_eq!(format.extension, "mp4");
    }

    #[test]
    fn test_negotiate_without_candidates_uses_default() {
        let candidates: Vec<String> = Vec::new();
        let format = RecordingFormat::negotiate(&candidates, |_| true);
        assert_eq!(format, RecordingFormat::default());
    }

    #[test]
    fn test_container_of_strips_parameters() {
        assert_eq!(container_of("video/webm; codecs=\"vp9,opus\""), "video/webm");
        assert_eq!(container_of("Video/X-Matroska;codecs=avc1"), "video/x-matroska");
        assert_eq!(RecordingFormat::from_encoding("video/x-matroska").extension, "mkv");
    }
}
