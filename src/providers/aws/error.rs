use std::fmt;

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::operation::describe_instances::DescribeInstancesError;
use thiserror::Error;

/// Error codes EC2 returns when a well-formed instance ID does not resolve.
/// `InvalidInstanceID.Malformed` stays an API error.
const NOT_FOUND_CODES: &[&str] = &["InvalidInstanceID.NotFound"];

/// EC2-specific errors that can occur during API operations.
#[derive(Debug, Error)]
pub enum AwsError {
    /// API returned an error response, or the request never completed
    #[error("API error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("instance not found: '{instance_id}'")]
    NotFound { instance_id: String },
}

impl AwsError {
    /// Classifies an SDK failure; a not-found code on a single-ID lookup
    /// becomes [`AwsError::NotFound`].
    pub(crate) fn from_sdk<R: fmt::Debug>(
        err: SdkError<DescribeInstancesError, R>,
        instance_ids: &[String],
    ) -> Self {
        let code = err.code().map(str::to_string);

        if let (Some(code), [instance_id]) = (code.as_deref(), instance_ids) {
            if NOT_FOUND_CODES.contains(&code) {
                return AwsError::NotFound {
                    instance_id: instance_id.clone(),
                };
            }
        }

        AwsError::Api {
            code: code.unwrap_or_else(|| "unknown".to_string()),
            message: DisplayErrorContext(&err).to_string(),
        }
    }
}

impl From<AwsError> for crate::providers::ProviderError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::NotFound { instance_id } => {
                crate::providers::ProviderError::NotFound { instance_id }
            }
            other => crate::providers::ProviderError::Aws(other.to_string()),
        }
    }
}
