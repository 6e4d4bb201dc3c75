/// Content-type validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing content type")]
    MissingContentType,

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },
}

/// A declared content type that passed the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedMediaType {
    /// Content type exactly as the client declared it
    pub declared: String,
    /// `type/subtype`, lowercased, parameters stripped
    pub mime: String,
    /// File extension derived from the subtype (`video/mp4` -> `mp4`)
    pub extension: String,
}

/// Strip parameters (`; charset=...`) and lowercase.
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Checks a declared content type against an allow-list.
///
/// Pure check: nothing is read from the upload stream.
#[derive(Debug, Clone)]
pub struct MediaTypeValidator {
    allowed_content_types: Vec<String>,
}

impl MediaTypeValidator {
    pub fn new(allowed_content_types: Vec<String>) -> Self {
        Self {
            allowed_content_types: allowed_content_types
                .iter()
                .map(|ct| normalize_mime_type(ct))
                .collect(),
        }
    }

    pub fn validate(&self, content_type: Option<&str>) -> Result<AcceptedMediaType, ValidationError> {
        let declared = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .ok_or(ValidationError::MissingContentType)?;

        let mime = normalize_mime_type(declared);
        let invalid = || ValidationError::InvalidContentType {
            content_type: declared.to_string(),
            allowed: self.allowed_content_types.clone(),
        };

        let (top, subtype) = mime.split_once('/').ok_or_else(invalid)?;
        if top.is_empty() || subtype.is_empty() || subtype.contains('/') {
            return Err(invalid());
        }

        if !self.allowed_content_types.iter().any(|ct| ct == &mime) {
            return Err(invalid());
        }

        Ok(AcceptedMediaType {
            declared: declared.to_string(),
            extension: subtype.to_string(),
            mime,
        })
    }
}
