use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use resgate::token::{self, Claims};

use crate::{error::GatewayError, AppState};

/// Proof that the request carried a valid bearer token. Handlers behind
/// [`require_bearer`] extract it instead of looking at credentials.
#[derive(Debug, Clone)]
pub struct Authorized(pub Claims);

pub async fn require_bearer<B>(
    State(state): State<AppState>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, GatewayError> {
    let bearer = bearer_token(request.headers()).ok_or(GatewayError::MissingToken)?;

    let claims = token::verify(&state.secret, bearer).map_err(|err| {
        tracing::info!(error = %err, "rejected bearer token");
        GatewayError::InvalidToken(err)
    })?;

    request.extensions_mut().insert(Authorized(claims));

    Ok(next.run(request).await)
}

/// The credentials of an `Authorization: Bearer` header. The scheme name is
/// matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let (scheme, credentials) = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .trim_start()
        .split_once(' ')?;

    let credentials = credentials.trim();
    (scheme.eq_ignore_ascii_case("Bearer") && !credentials.is_empty()).then_some(credentials)
}
