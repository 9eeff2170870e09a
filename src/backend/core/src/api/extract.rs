//! Path parameter extraction with the crate's 400 envelope.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

use crate::error::SalonError;
use crate::validation::parse_uuid;

/// The single UUID segment of a route such as `/appointments/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = SalonError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| SalonError::validation(rejection.body_text()))?;

        parse_uuid(&raw)
            .map(PathId)
            .ok_or_else(|| SalonError::validation(format!("invalid id in path: {}", raw)))
    }
}
