//! YAML front matter.
//!
//! ```text
//! ---
//! title: Jak zacząć
//! date: 2024-01-01
//! category: Poradnik
//! ---
//! Markdown body...
//! ```

use pigeon_site_core::{Error, PostMetadata, Result};
use serde_yaml::Value;
use std::path::Path;

const DELIMITER: &str = "---";

/// Split a document into `(front matter, body)`.
///
/// Returns `None` when the document does not open with a `---` line or
/// the block is never closed; callers then treat the whole file as body.
pub fn split_front_matter(source: &str) -> Option<(&str, &str)> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let first_end = source.find('\n').unwrap_or(source.len());
    if source[..first_end].trim_end() != DELIMITER {
        return None;
    }

    let yaml_start = (first_end + 1).min(source.len());
    let mut offset = yaml_start;
    for line in source[yaml_start..].split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &source[yaml_start..offset];
            let body = &source[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

/// Parse a front matter block into typed metadata.
///
/// `path` is only used for error messages.
pub fn parse_metadata(yaml: &str, path: &Path) -> Result<PostMetadata> {
    let value: Value = serde_yaml::from_str(yaml).map_err(|e| Error::FrontMatter {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mapping = match value {
        Value::Null => return Ok(PostMetadata::default()),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(Error::FrontMatter {
                path: path.to_path_buf(),
                message: "front matter must be a key/value mapping".to_string(),
            });
        }
    };

    let mut metadata = PostMetadata::default();
    for (key, value) in mapping {
        let Some(key) = scalar_to_string(&key) else {
            continue;
        };

        let slot = match key.as_str() {
            "title" => &mut metadata.title,
            "date" => &mut metadata.date,
            "category" => &mut metadata.category,
            "description" => &mut metadata.description,
            _ => {
                metadata.extra.insert(key, value);
                continue;
            }
        };

        match scalar_to_string(&value) {
            Some(text) => *slot = Some(text),
            None if value.is_null() => {}
            None => {
                metadata.extra.insert(key, value);
            }
        }
    }

    Ok(metadata)
}

/// Split and parse a whole document into `(metadata, body)`
pub fn parse_document(source: &str, path: &Path) -> Result<(PostMetadata, String)> {
    match split_front_matter(source) {
        Some((yaml, body)) => Ok((parse_metadata(yaml, path)?, body.to_string())),
        None => Ok((PostMetadata::default(), source.to_string())),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
