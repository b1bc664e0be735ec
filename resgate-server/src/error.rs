use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use resgate::{
    resource::{IdentifierError, ResourceIdentifier},
    token::TokenError,
    Error as ErrorBody,
};
use serde_json::Value;

/// Everything that can stop the gateway from returning a resource.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Connection failure or timeout talking to the upstream service.
    #[error("upstream object service is unavailable: {0}")]
    UpstreamUnavailable(#[source] reqwest::Error),
    #[error("upstream object service returned malformed JSON: {0}")]
    DownstreamMalformed(#[source] serde_json::Error),
    #[error("resource {0} was not found")]
    NotFound(ResourceIdentifier),
    /// Any other non-success response. Its status is passed through, except that
    /// the upstream refusing our own credentials is reported as a bad gateway.
    #[error("upstream object service responded with {status}")]
    UpstreamStatus { status: StatusCode, body: String },
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid bearer token: {0}")]
    InvalidToken(#[from] TokenError),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            GatewayError::DownstreamMalformed(_) => "DOWNSTREAM_MALFORMED",
            GatewayError::NotFound(_) => "NOT_FOUND",
            GatewayError::UpstreamStatus { .. } => "UPSTREAM_ERROR",
            GatewayError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            GatewayError::MissingToken | GatewayError::InvalidToken(_) => "UNAUTHORIZED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::DownstreamMalformed(_) => StatusCode::BAD_GATEWAY,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::UpstreamStatus { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN =>
            {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::UpstreamStatus { status, .. } => *status,
            GatewayError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            GatewayError::MissingToken | GatewayError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let challenge = matches!(
            self,
            GatewayError::MissingToken | GatewayError::InvalidToken(_)
        );
        let mut error = ErrorBody::new(self.code(), self.to_string());

        if let GatewayError::UpstreamStatus { body, .. } = &self {
            if !body.is_empty() {
                let details =
                    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone()));
                error = error.with_details(details);
            }
        }

        let mut response = (status, Json(error)).into_response();
        if challenge {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}
