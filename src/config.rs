use crate::{RenderError, RenderResult};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;
use std::path::PathBuf;

/// Connection settings for a render-ws deployment.
///
/// Every [`RenderClient`](crate::RenderClient) owns one of these; there are no
/// hidden defaults for owner or project, so each call is scoped explicitly by
/// the configuration it was built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// URL scheme, `http` unless the deployment sits behind TLS.
    pub scheme: String,
    /// Host name of the render-ws server.
    pub host: String,
    /// Port of the render-ws server. Omitted from URLs when `None`.
    pub port: Option<u16>,
    /// Stack and match collection owner.
    pub owner: String,
    /// Project containing the stacks.
    pub project: String,
    /// Path to the `run_ws_client.sh` style launcher of the Java clients.
    pub client_script: Option<PathBuf>,
    /// Heap size handed to the Java client launcher, e.g. `1G`.
    pub client_heap: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_owned(),
            host: String::new(),
            port: None,
            owner: String::new(),
            project: String::new(),
            client_script: None,
            client_heap: "1G".to_owned(),
        }
    }
}

/// Script name looked up inside `RENDER_CLIENT_SCRIPTS`.
const CLIENT_SCRIPT_NAME: &str = "run_ws_client.sh";

impl RenderConfig {
    /// Create a configuration for the given server and project.
    pub fn new(
        host: impl Into<String>,
        port: Option<u16>,
        owner: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            owner: owner.into(),
            project: project.into(),
            ..Self::default()
        }
    }

    /// Read the configuration from `RENDER_*` environment variables.
    ///
    /// `RENDER_HOST` is required. `RENDER_CLIENT_SCRIPT` takes precedence over
    /// `RENDER_CLIENT_SCRIPTS`, which names the directory holding
    /// `run_ws_client.sh`.
    pub fn from_env() -> RenderResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RenderResult<Self> {
        let defaults = Self::default();

        let host = lookup("RENDER_HOST")
            .ok_or_else(|| RenderError::config("RENDER_HOST is not set"))?;

        let port = lookup("RENDER_PORT")
            .map(|port| {
                port.parse::<u16>()
                    .map_err(|err| RenderError::config(format!("RENDER_PORT={port}: {err}")))
            })
            .transpose()?;

        let client_script = lookup("RENDER_CLIENT_SCRIPT").map(PathBuf::from).or_else(|| {
            lookup("RENDER_CLIENT_SCRIPTS").map(|dir| PathBuf::from(dir).join(CLIENT_SCRIPT_NAME))
        });

        Ok(Self {
            scheme: lookup("RENDER_SCHEME").unwrap_or(defaults.scheme),
            host,
            port,
            owner: lookup("RENDER_OWNER").unwrap_or_default(),
            project: lookup("RENDER_PROJECT").unwrap_or_default(),
            client_script,
            client_heap: lookup("RENDER_CLIENT_HEAP").unwrap_or(defaults.client_heap),
        })
    }

    /// Root of the render-ws v1 API, e.g. `http://host:8080/render-ws/v1`.
    ///
    /// IPv6 literal hosts are bracketed.
    pub fn base_data_url(&self) -> String {
        let host = if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        match self.port {
            Some(port) => format!("{}://{host}:{port}/render-ws/v1", self.scheme),
            None => format!("{}://{host}/render-ws/v1", self.scheme),
        }
    }

    /// URL under the API root with the given segments appended.
    pub(crate) fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> RenderResult<Url> {
        if self.host.is_empty() {
            return Err(RenderError::config("host is not set"));
        }
        let base = self.base_data_url();
        let mut url = Url::parse(&base).map_err(|err| RenderError::InvalidUrl {
            url: base.clone(),
            reason: err.to_string(),
        })?;
        let _ = url
            .path_segments_mut()
            .map_err(|()| RenderError::InvalidUrl {
                url: base,
                reason: "cannot be a base".to_owned(),
            })?
            .extend(segments);
        Ok(url)
    }

    /// URL of a stack, with further segments appended.
    pub(crate) fn stack_url<'seg>(
        &'seg self,
        stack: &'seg str,
        segments: impl IntoIterator<Item = &'seg str>,
    ) -> RenderResult<Url> {
        self.url(
            [
                "owner",
                self.owner.as_str(),
                "project",
                self.project.as_str(),
                "stack",
                stack,
            ]
            .into_iter()
            .chain(segments),
        )
    }
}
