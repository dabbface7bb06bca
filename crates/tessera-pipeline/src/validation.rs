//! Resource validation run before persisting.

use tessera_core::models::Resource;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Checks a mutated resource before it is persisted.
pub trait ResourceValidator: Send + Sync {
    /// One `field: message` entry per violation. Empty means valid.
    fn validate(&self, resource: &Resource) -> Vec<String>;
}

/// Validates the resource's declared field rules plus the content-holding invariant.
#[derive(Debug, Default, Clone)]
pub struct SchemaValidator;

impl ResourceValidator for SchemaValidator {
    fn validate(&self, resource: &Resource) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(validation_errors) = resource.validate() {
            flatten_errors("", &validation_errors, &mut errors);
        }

        if !resource.can_hold_content() && resource.file_count() > 0 {
            errors.push(
                "content: collections and sequences may only contain relations".to_string(),
            );
        }

        errors
    }
}

/// Field name as it appears in the JSON document (`mime_type` -> `mimeType`).
fn wire_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !name.is_empty();
        } else if upper {
            name.extend(c.to_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }
    name
}

fn join_path(prefix: &str, field: &str) -> String {
    match (prefix.is_empty(), field) {
        (false, "__all__") => prefix.to_string(),
        (true, _) => wire_name(field),
        (false, _) => format!("{}.{}", prefix, wire_name(field)),
    }
}

/// Render nested validator errors as `path: message`, sorted by path.
fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = join_path(prefix, field);
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push(format!("{}: {}", path, message));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}
