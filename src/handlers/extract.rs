use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::Payload;
use crate::state::AppState;

pub struct CurrentUser(pub i64);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state.identity.resolve_caller(&parts.headers).map(CurrentUser)
    }
}

// A JSON object body. Malformed JSON is reported in the regular error
// envelope instead of axum's plain-text rejection; `null` counts as `{}`.
pub struct JsonBody(pub Payload);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(Value::Object(map))) => Ok(JsonBody(map)),
            Ok(Json(Value::Null)) => Ok(JsonBody(Payload::new())),
            Ok(_) => Err(AppError::InvalidRequest(
                "Request body must be a JSON object".to_string(),
            )),
            Err(rejection) => Err(AppError::InvalidRequest(format!("Invalid JSON: {rejection}"))),
        }
    }
}
