use axum::{
    extract::{Path, State},
    Extension, Json,
};
use resgate::resource::{ResourceDocument, ResourceIdentifier};

use crate::{auth::Authorized, error::GatewayError, AppState};

#[tracing::instrument(skip_all, fields(id = %id, sub = %authorized.0.sub))]
pub async fn get_resource(
    State(state): State<AppState>,
    Extension(authorized): Extension<Authorized>,
    Path(id): Path<String>,
) -> Result<Json<ResourceDocument>, GatewayError> {
    let id = ResourceIdentifier::new(id)?;
    let document = state.upstream.fetch_object(&id).await?;

    if document.external_identifier() != Some(id.as_str()) {
        tracing::warn!(
            returned = document.external_identifier().unwrap_or(""),
            "upstream externalIdentifier differs from the requested identifier"
        );
    }

    let missing = document.missing_fields();
    if !missing.is_empty() {
        tracing::warn!(?missing, "passing through incomplete resource description");
    }

    tracing::debug!(version = ?document.version(), "resource retrieved");

    Ok(Json(document))
}
