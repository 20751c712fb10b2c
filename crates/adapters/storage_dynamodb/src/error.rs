//! Storage-specific error type wrapping `DynamoDB` SDK errors.

use tablegate_domain::error::CrudError;

/// Errors originating from the `DynamoDB` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A `DynamoDB` request failed.
    #[error("dynamodb request failed")]
    Dynamo(#[from] aws_sdk_dynamodb::Error),

    /// An item could not be converted to or from attribute values.
    #[error("attribute conversion failed")]
    Conversion(#[from] serde_dynamo::Error),

    /// A request could not be assembled.
    #[error("invalid request")]
    Build(#[from] aws_sdk_dynamodb::error::BuildError),
}

impl StorageError {
    /// Wrap any operation error the SDK can fold into its top-level error.
    pub(crate) fn sdk<E>(err: E) -> Self
    where
        aws_sdk_dynamodb::Error: From<E>,
    {
        Self::Dynamo(err.into())
    }
}

impl From<StorageError> for CrudError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
