//! Request validation. Mirrors the `Valid(ctx) -> problems map` discipline
//! the rest of this protocol's handlers use: a request body is decoded,
//! then checked, with every problem collected before any is reported.

use crate::error::{validation_error, ApiError};
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

pub trait Validate {
    /// Returns one problem per invalid field, keyed by field name. Empty
    /// means the value is valid.
    fn validate(&self) -> HashMap<String, String>;
}

/// A `Json<T>` extractor that additionally runs [`Validate::validate`],
/// rejecting with a 400 `InvalidArgument` envelope carrying
/// `metadata.problems` when any field fails.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        let problems = value.validate();
        if !problems.is_empty() {
            return Err(validation_error(problems));
        }
        Ok(ValidJson(value))
    }
}
