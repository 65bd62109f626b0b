use std::fmt::Display;

use async_trait::async_trait;
use axum::extract::{FromRequest, RequestParts};

use crate::error::Error;

/// Wraps a body, path or query extractor so a malformed request surfaces as
/// a validation [`Error`] with the usual JSON body.
///
/// ```ignore
/// async fn handler(Input(Json(params)): Input<Json<NewRide>>) { .. }
/// ```
pub struct Input<E>(pub E);

#[async_trait]
impl<B, E> FromRequest<B> for Input<E>
where
    B: Send,
    E: FromRequest<B>,
    E::Rejection: Display,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        match E::from_request(req).await {
            Ok(value) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(%rejection, "rejected malformed request");
                Err(Error::invalid_input_error(rejection.to_string()))
            }
        }
    }
}
