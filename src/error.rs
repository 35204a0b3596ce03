use thiserror::Error;

use crate::instance::UnsupportedAttribute;
use crate::providers::ProviderError;
use crate::terraform::{ParseError, UnsupportedFormatError};

#[derive(Debug, Error)]
pub enum Ec2DiffError {
    /// Invalid flags or inputs that only surface after argument parsing
    #[error("usage error: {0}")]
    Usage(String),

    #[error(transparent)]
    UnsupportedAttribute(#[from] UnsupportedAttribute),

    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormatError),

    #[error("failed to parse declared state: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to fetch live state: {0}")]
    Fetch(#[from] ProviderError),

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_usage_error_display() {
        let err = Ec2DiffError::Usage("instance 'i-9' is not declared".to_string());
        assert_eq!(err.to_string(), "usage error: instance 'i-9' is not declared");
    }

    #[test]
    fn test_unsupported_attribute_is_transparent() {
        let err: Ec2DiffError = "ami".parse::<crate::instance::Attribute>().unwrap_err().into();
        assert!(matches!(err, Ec2DiffError::UnsupportedAttribute(_)));
        assert!(err.to_string().starts_with("attribute 'ami' not supported"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Ec2DiffError = io_err.into();
        assert!(matches!(err, Ec2DiffError::Output(_)));
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn test_provider_error_from_conversion() {
        let provider_err = ProviderError::UnknownProvider("gcp".to_string());
        let err: Ec2DiffError = provider_err.into();
        assert!(matches!(err, Ec2DiffError::Fetch(_)));
        assert!(err.to_string().contains("unknown provider: gcp"));
    }

    #[test]
    fn test_parse_error_from_conversion() {
        let err: Ec2DiffError = ParseError::NoInstanceIds.into();
        assert!(matches!(err, Ec2DiffError::Parse(_)));
        assert!(err.to_string().contains("no instance ids provided"));
    }
}
