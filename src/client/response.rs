use crate::{RenderError, RenderResult};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

pub(crate) trait Response: Sized {
    fn prepare_reqwest(request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
    }

    fn from_body(body: &[u8]) -> RenderResult<Self>;
}

/// JSON response decoded into `T`.
pub(crate) struct JsonResponse<T>(pub(crate) T);

impl<T: DeserializeOwned> Response for JsonResponse<T> {
    fn prepare_reqwest(request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header(ACCEPT, "application/json")
    }

    fn from_body(body: &[u8]) -> RenderResult<Self> {
        serde_json::from_slice(body)
            .map(Self)
            .map_err(|source| RenderError::NonJsonResponse {
                body: String::from_utf8_lossy(body).into_owned(),
                source,
            })
    }
}

// Deletes and imports answer with an empty body.
impl Response for () {
    fn from_body(_body: &[u8]) -> RenderResult<Self> {
        Ok(())
    }
}
