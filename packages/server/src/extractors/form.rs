use axum::extract::{FromRequest, Request};
use axum_extra::extract::{Form, FormRejection};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A form body extractor that converts deserialization errors into
/// `AppError::Validation`.
///
/// Backed by `axum_extra`'s `Form`, so repeated keys (`ids[]=a&ids[]=b`)
/// collect into a `Vec`.
pub struct AppForm<T>(pub T);

impl<S, T> FromRequest<S> for AppForm<T>
where
    Form<T>: FromRequest<S, Rejection = FormRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;
        Ok(AppForm(value))
    }
}
