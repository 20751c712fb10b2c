//! Error response mapping.

use serde_json::{Value, json};
use tablegate_app::settings::Environment;
use tablegate_domain::error::{ConflictError, CrudError, ValidationError, error_chain};

use crate::event::GatewayResponse;
use crate::response;

/// Every way a request can fail, mapped to a status code and JSON body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] CrudError),

    /// The request body is not valid JSON.
    #[error("malformed request body")]
    MalformedBody(#[source] serde_json::Error),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("endpoint not found")]
    RouteNotFound,
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Domain(err.into())
    }
}

impl ApiError {
    /// Whether the failure is on the server side and must be logged as such.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Domain(CrudError::Storage(_)) | Self::MalformedBody(_)
        )
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(CrudError::Validation(_)) => 400,
            Self::Domain(CrudError::NotFound(_)) | Self::RouteNotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::Domain(CrudError::Conflict(_)) => 409,
            Self::Domain(CrudError::Storage(_)) | Self::MalformedBody(_) => 500,
        }
    }

    /// Render the error for `environment`.
    ///
    /// Internal failures carry their error text only in development.
    #[must_use]
    pub fn into_response(self, environment: &Environment) -> GatewayResponse {
        let body = match &self {
            Self::Domain(CrudError::Validation(err)) => validation_body(err),
            Self::Domain(CrudError::NotFound(_)) => json!({"error": "Item not found"}),
            Self::Domain(CrudError::Conflict(ConflictError::AlreadyExists(_))) => {
                json!({"error": "Item already exists"})
            }
            Self::Domain(CrudError::Conflict(ConflictError::VersionMismatch { .. })) => {
                json!({"error": "Version conflict - item was modified by another request"})
            }
            Self::MethodNotAllowed => json!({"error": "Method not allowed"}),
            Self::RouteNotFound => json!({"error": "Endpoint not found"}),
            Self::Domain(CrudError::Storage(_)) | Self::MalformedBody(_) => {
                let message = if environment.exposes_error_details() {
                    error_chain(&self)
                } else {
                    "An unexpected error occurred".to_string()
                };
                json!({"error": "Internal server error", "message": message})
            }
        };
        response::json(self.status_code(), &body)
    }
}

fn validation_body(err: &ValidationError) -> Value {
    match err {
        ValidationError::MissingKeyFields(_) => {
            json!({"error": "Validation failed", "details": err.field_messages()})
        }
        ValidationError::InvalidBatchItems(failures) => {
            json!({"error": "Validation failed", "details": failures})
        }
        _ => json!({"error": err.to_string()}),
    }
}
