//! Remote-file attribute validation
//!
//! A remote-file manifest carries an `attributes` object per file. Its shape
//! depends on the file's mime type, so validation goes through a registry of
//! [`AttributeValidator`]s; the first validator that supports a mime type owns it.

use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

/// Validates the `attributes` object of files with a given family of mime types.
pub trait AttributeValidator: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, mime_type: &str) -> bool;

    /// Returns one `field: message` entry per problem. Empty means valid.
    fn validate(&self, attributes: &Map<String, JsonValue>) -> Vec<String>;
}

#[derive(Clone)]
pub struct AttributeValidatorRegistry {
    validators: Vec<Arc<dyn AttributeValidator>>,
}

impl Default for AttributeValidatorRegistry {
    fn default() -> Self {
        Self::new()
            .register(Arc::new(VideoAttributes))
            .register(Arc::new(AudioAttributes))
            .register(Arc::new(ImageAttributes))
            .register(Arc::new(DocumentAttributes))
    }
}

impl AttributeValidatorRegistry {
    /// Registry without any validators: every attributes object is accepted.
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    pub fn register(mut self, validator: Arc<dyn AttributeValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn validator_for(&self, mime_type: &str) -> Option<&Arc<dyn AttributeValidator>> {
        let mime_type = mime_type.to_lowercase();
        self.validators.iter().find(|v| v.supports(&mime_type))
    }

    pub fn validate(&self, mime_type: &str, attributes: &JsonValue) -> Vec<String> {
        let Some(attributes) = attributes.as_object() else {
            return vec!["attributes: must be an object".to_string()];
        };

        match self.validator_for(mime_type) {
            Some(validator) => validator.validate(attributes),
            None => Vec::new(),
        }
    }
}

// Field checks shared by the built-in validators.

fn check_known_keys(
    attributes: &Map<String, JsonValue>,
    allowed: &[&str],
    family: &str,
    errors: &mut Vec<String>,
) {
    let mut unknown: Vec<&String> = attributes
        .keys()
        .filter(|k| !allowed.contains(&k.as_str()))
        .collect();
    unknown.sort();
    for key in unknown {
        errors.push(format!("{}: unknown attribute for {} files", key, family));
    }
}

fn check_number(
    attributes: &Map<String, JsonValue>,
    key: &str,
    strictly_positive: bool,
    errors: &mut Vec<String>,
) {
    let Some(value) = attributes.get(key) else {
        return;
    };
    match value.as_f64() {
        Some(n) if strictly_positive && n <= 0.0 => {
            errors.push(format!("{}: must be greater than 0", key))
        }
        Some(n) if n < 0.0 => errors.push(format!("{}: must not be negative", key)),
        Some(_) => {}
        None => errors.push(format!("{}: must be a number", key)),
    }
}

fn check_positive_integer(
    attributes: &Map<String, JsonValue>,
    key: &str,
    errors: &mut Vec<String>,
) {
    let Some(value) = attributes.get(key) else {
        return;
    };
    match value.as_u64() {
        Some(n) if n >= 1 => {}
        _ => errors.push(format!("{}: must be a positive integer", key)),
    }
}

fn check_frame_size(attributes: &Map<String, JsonValue>, errors: &mut Vec<String>) {
    let Some(value) = attributes.get("frameSize") else {
        return;
    };
    let Some(frame) = value.as_object() else {
        errors.push("frameSize: must be an object with width and height".to_string());
        return;
    };
    for dimension in ["width", "height"] {
        match frame.get(dimension).and_then(JsonValue::as_u64) {
            Some(n) if n >= 1 => {}
            _ => errors.push(format!(
                "frameSize.{}: must be a positive integer",
                dimension
            )),
        }
    }
}

/// `video/*`: duration, frameSize, frameRate, bitrate.
pub struct VideoAttributes;

impl AttributeValidator for VideoAttributes {
    fn name(&self) -> &'static str {
        "video"
    }

    fn supports(&self, mime_type: &str) -> bool {
        mime_type.starts_with("video/")
    }

    fn validate(&self, attributes: &Map<String, JsonValue>) -> Vec<String> {
        let mut errors = Vec::new();
        check_known_keys(
            attributes,
            &["duration", "frameSize", "frameRate", "bitrate"],
            "video",
            &mut errors,
        );
        check_number(attributes, "duration", false, &mut errors);
        check_frame_size(attributes, &mut errors);
        check_number(attributes, "frameRate", true, &mut errors);
        check_number(attributes, "bitrate", true, &mut errors);
        errors
    }
}

/// `audio/*`: duration, bitrate, channels.
pub struct AudioAttributes;

impl AttributeValidator for AudioAttributes {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn supports(&self, mime_type: &str) -> bool {
        mime_type.starts_with("audio/")
    }

    fn validate(&self, attributes: &Map<String, JsonValue>) -> Vec<String> {
        let mut errors = Vec::new();
        check_known_keys(
            attributes,
            &["duration", "bitrate", "channels"],
            "audio",
            &mut errors,
        );
        check_number(attributes, "duration", false, &mut errors);
        check_number(attributes, "bitrate", true, &mut errors);
        check_positive_integer(attributes, "channels", &mut errors);
        errors
    }
}

/// `image/*`: frameSize, units.
pub struct ImageAttributes;

impl AttributeValidator for ImageAttributes {
    fn name(&self) -> &'static str {
        "image"
    }

    fn supports(&self, mime_type: &str) -> bool {
        mime_type.starts_with("image/")
    }

    fn validate(&self, attributes: &Map<String, JsonValue>) -> Vec<String> {
        let mut errors = Vec::new();
        check_known_keys(attributes, &["frameSize", "units"], "image", &mut errors);
        check_frame_size(attributes, &mut errors);
        if let Some(units) = attributes.get("units") {
            if !units.as_str().is_some_and(|u| !u.trim().is_empty()) {
                errors.push("units: must be a non-empty string".to_string());
            }
        }
        errors
    }
}

/// `application/pdf` and `text/*`: pages.
pub struct DocumentAttributes;

impl AttributeValidator for DocumentAttributes {
    fn name(&self) -> &'static str {
        "document"
    }

    fn supports(&self, mime_type: &str) -> bool {
        mime_type == "application/pdf" || mime_type.starts_with("text/")
    }

    fn validate(&self, attributes: &Map<String, JsonValue>) -> Vec<String> {
        let mut errors = Vec::new();
        check_known_keys(attributes, &["pages"], "document", &mut errors);
        check_positive_integer(attributes, "pages", &mut errors);
        errors
    }
}
