use std::path::PathBuf;

use thiserror::Error;

/// Failures turning a declared-state file into instances.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content could not be decoded into the expected schema
    #[error("failed to parse '{}': {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("no aws_instance resources found in '{}'", path.display())]
    NoResources { path: PathBuf },

    #[error("no instance ids provided")]
    NoInstanceIds,

    #[error("given instance ids exceed found resources ({given} ids, {found} resources)")]
    TooManyInstanceIds { given: usize, found: usize },

    #[error("instance id '{id}' is bound more than once")]
    DuplicateInstanceId { id: String },

    #[error("no aws_instance resource labelled '{label}'")]
    UnknownBlockLabel { label: String },

    #[error("instance ids must be either all positional or all 'label=id'")]
    MixedBindings,

    #[error("unsupported expression for '{attribute}' in aws_instance.{resource}")]
    UnsupportedExpression { resource: String, attribute: String },
}

/// No registered parser handles the file's extension.
#[derive(Debug, Error)]
#[error("no parser found for '{}' (supported extensions: {})", path.display(), supported.join(", "))]
pub struct UnsupportedFormatError {
    pub path: PathBuf,
    pub supported: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_ids_display() {
        let err = ParseError::TooManyInstanceIds { given: 3, found: 1 };
        assert_eq!(
            err.to_string(),
            "given instance ids exceed found resources (3 ids, 1 resources)"
        );
    }

    #[test]
    fn test_no_resources_display() {
        let err = ParseError::NoResources {
            path: PathBuf::from("state.json"),
        };
        assert_eq!(err.to_string(), "no aws_instance resources found in 'state.json'");
    }

    #[test]
    fn test_read_error_keeps_source() {
        let err = ParseError::Read {
            path: PathBuf::from("missing.tfstate"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        assert!(err.to_string().contains("missing.tfstate"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unsupported_format_display() {
        let err = UnsupportedFormatError {
            path: PathBuf::from("state.yaml"),
            supported: vec![".json".to_string(), ".tf".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no parser found for 'state.yaml' (supported extensions: .json, .tf)"
        );
    }
}
