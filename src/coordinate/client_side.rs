//! Batch transforms computed by the render Java `CoordinateClient`.
//!
//! The request is written to a temporary JSON file, the client is launched
//! through the configured `run_ws_client.sh` style script and its JSON output
//! file is read back. Both files are removed afterwards unless
//! [`ClientSideOptions::keep_temp_files`] is set.

use super::{Direction, TileCoordinates};
use crate::{RenderClient, RenderConfig, RenderError, RenderResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const COORDINATE_CLIENT_CLASS: &str = "org.janelia.render.client.CoordinateClient";

/// Settings for a client-side batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSideOptions {
    /// Worker threads used by the Java client.
    ///
    /// Defaults to 20.
    pub number_of_threads: usize,
    /// Leave the input and output JSON files in place for debugging.
    ///
    /// Disabled by default.
    pub keep_temp_files: bool,
}

impl Default for ClientSideOptions {
    fn default() -> Self {
        Self {
            number_of_threads: 20,
            keep_temp_files: false,
        }
    }
}

/// JSON file in the system temp dir, removed on drop unless kept.
#[derive(Debug)]
struct TempJson {
    path: PathBuf,
    keep: bool,
}

impl TempJson {
    fn new(prefix: &str, keep: bool) -> Self {
        Self {
            path: std::env::temp_dir().join(format!(
                "{prefix}{suffix:016x}.json",
                suffix = rand::random::<u64>()
            )),
            keep,
        }
    }
}

impl Drop for TempJson {
    fn drop(&mut self) {
        if self.keep {
            tracing::debug!(path = %self.path.display(), "Keeping temporary file");
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "Failed to remove temporary file");
            }
        }
    }
}

const fn java_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn coordinate_client_args(
    config: &RenderConfig,
    stack: &str,
    z: f64,
    from_json: &Path,
    to_json: &Path,
    direction: Direction,
    number_of_threads: usize,
) -> Vec<OsString> {
    [
        ("--baseDataUrl", OsString::from(config.base_data_url())),
        ("--owner", config.owner.clone().into()),
        ("--project", config.project.clone().into()),
        ("--stack", stack.into()),
        ("--z", z.to_string().into()),
        ("--fromJson", from_json.into()),
        ("--toJson", to_json.into()),
        (
            "--localToWorld",
            java_bool(direction == Direction::LocalToWorld).into(),
        ),
        ("--numberOfThreads", number_of_threads.to_string().into()),
    ]
    .into_iter()
    .flat_map(|(flag, value)| [OsString::from(flag), value])
    .collect()
}

impl RenderClient {
    /// Run the Java `CoordinateClient` on `request` and decode its output.
    ///
    /// Produces the same JSON the batch endpoint for `direction` would.
    #[tracing::instrument(level = "debug", skip(self, request), fields(%direction), err)]
    pub async fn map_coordinates_clientside<Req, Resp>(
        &self,
        stack: &str,
        request: &Req,
        z: f64,
        direction: Direction,
        options: &ClientSideOptions,
    ) -> RenderResult<Resp>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        let config = self.config();
        let script = config
            .client_script
            .as_deref()
            .ok_or_else(|| RenderError::config("client_script is required for client-side batches"))?;

        let input = TempJson::new("render_coordinates_in_", options.keep_temp_files);
        let output = TempJson::new("render_coordinates_out_", options.keep_temp_files);

        tokio::fs::write(&input.path, serde_json::to_vec(request)?).await?;

        tracing::debug!(script = %script.display(), input = %input.path.display(), "Launching coordinate client");

        let status = Command::new(script)
            .arg(&config.client_heap)
            .arg(COORDINATE_CLIENT_CLASS)
            .args(coordinate_client_args(
                config,
                stack,
                z,
                &input.path,
                &output.path,
                direction,
                options.number_of_threads,
            ))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await?;

        if !status.success() {
            return Err(RenderError::ClientProcess { status });
        }

        let body = tokio::fs::read(&output.path).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Client-side equivalent of
    /// [`world_to_local_coordinates_batch`](Self::world_to_local_coordinates_batch).
    pub async fn world_to_local_coordinates_clientside(
        &self,
        stack: &str,
        records: &[TileCoordinates],
        z: f64,
        options: &ClientSideOptions,
    ) -> RenderResult<Vec<Vec<TileCoordinates>>> {
        self.map_coordinates_clientside(stack, records, z, Direction::WorldToLocal, options)
            .await
    }

    /// Client-side equivalent of
    /// [`local_to_world_coordinates_batch`](Self::local_to_world_coordinates_batch).
    ///
    /// The Java client reads local points in the candidate-list shape it emits
    /// for world-to-local, so each record is sent as a one-element list.
    pub async fn local_to_world_coordinates_clientside(
        &self,
        stack: &str,
        records: &[TileCoordinates],
        z: f64,
        options: &ClientSideOptions,
    ) -> RenderResult<Vec<TileCoordinates>> {
        let candidates = records.iter().map(std::slice::from_ref).collect::<Vec<_>>();
        self.map_coordinates_clientside(stack, &candidates, z, Direction::LocalToWorld, options)
            .await
    }
}
