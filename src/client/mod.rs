mod params;
pub(crate) use params::Action;

mod response;
pub(crate) use response::{JsonResponse, Response};

use crate::{RenderConfig, RenderError, RenderResult};
use futures::TryFutureExt;
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::Instrument;

/// Client for a render-ws deployment.
///
/// Wraps a pooled HTTP session together with the [`RenderConfig`] that scopes
/// every request (host, owner, project). Operations are grouped by area:
/// coordinate mapping lives in [`crate::coordinate`], point matches in
/// [`crate::pointmatch`].
#[derive(Debug, Clone)]
pub struct RenderClient {
    http: reqwest::Client,
    config: RenderConfig,
}

impl RenderClient {
    /// Create a client with a fresh HTTP session.
    pub fn new(config: RenderConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    /// Create a client reusing an existing HTTP session.
    pub const fn with_http_client(config: RenderConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    /// Configuration this client was built with.
    pub const fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> RenderResult<T> {
        self.request::<JsonResponse<T>>(Action::GET, url)
            .await
            .map(|JsonResponse(value)| value)
    }

    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + ?Sized + Sync),
    ) -> RenderResult<T> {
        self.request::<JsonResponse<T>>(Action::Put(body), url)
            .await
            .map(|JsonResponse(value)| value)
    }

    pub(crate) async fn request<Resp: Response>(
        &self,
        action: Action<impl Serialize>,
        url: Url,
    ) -> RenderResult<Resp> {
        let method = action.method();

        let span = tracing::debug_span!("render-ws request", %method, %url);

        async move {
            let mut request = self.http.request(method, url);

            if let Action::Put(body) = &action {
                request = request.json(body);
            }

            request = Resp::prepare_reqwest(request);

            tracing::debug!("Sending request");

            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;

            tracing::debug!(%status, len = body.len(), "Received response");

            if !status.is_success() {
                return Err(RenderError::Status {
                    status,
                    body: String::from_utf8_lossy(&body).into_owned(),
                });
            }

            Resp::from_body(&body)
        }
        .inspect_err(|err| tracing::error!(%err, "render-ws request failed"))
        .instrument(span)
        .await
    }
}
