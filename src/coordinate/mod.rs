/*!
Coordinate mapping between world (stitched) and local (per-tile) space.

render-ws exposes two flavours of every transform:

* single point lookups via `GET`, e.g.
  `/stack/{stack}/z/{z}/world-to-local-coordinates/{x},{y}`;
* batch lookups via `PUT` of a JSON array of [`TileCoordinates`], e.g.
  `/stack/{stack}/z/{z}/local-to-world-coordinates`.

The `*_array` methods accept an `(n, 2)` array of points, package it with
[`codec::package`], send it through the batch endpoint (or the Java
`CoordinateClient` when [`BatchMode::ClientSide`] is selected) and unpack the
answer back into an `(n, 2)` array in the original order.

World-to-local answers hold a list of candidate tiles per point, as a world
point can fall into several overlapping tiles. Only the candidate for the
queried tile is kept.
*/

pub mod codec;

#[cfg(feature = "client-side")]
pub mod client_side;
#[cfg(feature = "client-side")]
pub use client_side::ClientSideOptions;


use crate::{RenderClient, RenderResult};
use derive_more::Display;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// An `(x, y)` pair in either world or local space.
pub type Point = [f64; 2];

/// Coordinate space of a point, doubling as its JSON key.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    /// Coordinates within a single tile.
    #[display("local")]
    Local,
    /// Coordinates in the stitched stack.
    #[display("world")]
    World,
}

/// Direction of a coordinate transform.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Stitched stack coordinates to tile coordinates.
    #[display("world-to-local")]
    WorldToLocal,
    /// Tile coordinates to stitched stack coordinates.
    #[display("local-to-world")]
    LocalToWorld,
}

impl Direction {
    /// Space of the points sent to the service.
    pub const fn source(self) -> CoordinateSpace {
        match self {
            Self::WorldToLocal => CoordinateSpace::World,
            Self::LocalToWorld => CoordinateSpace::Local,
        }
    }

    /// Space of the points received from the service.
    pub const fn target(self) -> CoordinateSpace {
        match self {
            Self::WorldToLocal => CoordinateSpace::Local,
            Self::LocalToWorld => CoordinateSpace::World,
        }
    }

    pub(crate) const fn path_segment(self) -> &'static str {
        match self {
            Self::WorldToLocal => "world-to-local-coordinates",
            Self::LocalToWorld => "local-to-world-coordinates",
        }
    }
}

/// Per-point record exchanged with render-ws.
///
/// Requests carry the tile id and the point under the key of its space;
/// responses add the transformed point under the other key. Coordinate arrays
/// may carry a trailing z value, only the first two entries are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileCoordinates {
    /// Tile the coordinates belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_id: Option<String>,
    /// Local (tile) coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<Vec<f64>>,
    /// World (stack) coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<Vec<f64>>,
    /// Whether the point is visible in the tile, for world-to-local answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    /// Per-point failure reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TileCoordinates {
    /// Record for `point` in `space` on tile `tile_id`.
    pub fn new(tile_id: impl Into<String>, space: CoordinateSpace, point: Point) -> Self {
        let mut record = Self {
            tile_id: Some(tile_id.into()),
            ..Self::default()
        };
        *record.slot_mut(space) = Some(point.to_vec());
        record
    }

    /// Coordinates in `space`, if present with at least two components.
    pub fn coordinates(&self, space: CoordinateSpace) -> Option<Point> {
        match self.slot(space)? {
            [x, y, ..] => Some([*x, *y]),
            _ => None,
        }
    }

    fn slot(&self, space: CoordinateSpace) -> Option<&[f64]> {
        match space {
            CoordinateSpace::Local => self.local.as_deref(),
            CoordinateSpace::World => self.world.as_deref(),
        }
    }

    const fn slot_mut(&mut self, space: CoordinateSpace) -> &mut Option<Vec<f64>> {
        match space {
            CoordinateSpace::Local => &mut self.local,
            CoordinateSpace::World => &mut self.world,
        }
    }
}

/// Where batch transforms are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchMode {
    /// Through the render-ws batch endpoints.
    #[default]
    Server,
    /// Through the Java `CoordinateClient` run locally.
    #[cfg(feature = "client-side")]
    ClientSide(ClientSideOptions),
}

/// z is rendered as its shortest float form, so `3.0` becomes `3`.
fn z_segment(z: f64) -> String {
    z.to_string()
}

fn point_segment(x: f64, y: f64) -> String {
    format!("{x:.6},{y:.6}")
}

impl RenderClient {
    /// Map a world point on layer `z` to all tiles containing it.
    pub async fn world_to_local_coordinates(
        &self,
        stack: &str,
        z: f64,
        x: f64,
        y: f64,
    ) -> RenderResult<Vec<TileCoordinates>> {
        let z = z_segment(z);
        let point = point_segment(x, y);
        let url = self.config().stack_url(
            stack,
            ["z", z.as_str(), Direction::WorldToLocal.path_segment(), point.as_str()],
        )?;
        self.get(url).await
    }

    /// Map a point local to `tile_id` into world space.
    pub async fn local_to_world_coordinates(
        &self,
        stack: &str,
        tile_id: &str,
        x: f64,
        y: f64,
    ) -> RenderResult<TileCoordinates> {
        let point = point_segment(x, y);
        let url = self.config().stack_url(
            stack,
            ["tile", tile_id, Direction::LocalToWorld.path_segment(), point.as_str()],
        )?;
        self.get(url).await
    }

    async fn batch<T: serde::de::DeserializeOwned>(
        &self,
        stack: &str,
        z: f64,
        direction: Direction,
        records: &[TileCoordinates],
    ) -> RenderResult<T> {
        let z = z_segment(z);
        let url = self
            .config()
            .stack_url(stack, ["z", z.as_str(), direction.path_segment()])?;
        self.put(url, records).await
    }

    /// Map a batch of world points on layer `z`.
    ///
    /// Returns the candidate tiles for each point, in request order.
    pub async fn world_to_local_coordinates_batch(
        &self,
        stack: &str,
        z: f64,
        records: &[TileCoordinates],
    ) -> RenderResult<Vec<Vec<TileCoordinates>>> {
        self.batch(stack, z, Direction::WorldToLocal, records).await
    }

    /// Map a batch of tile-local points on layer `z` into world space.
    pub async fn local_to_world_coordinates_batch(
        &self,
        stack: &str,
        z: f64,
        records: &[TileCoordinates],
    ) -> RenderResult<Vec<TileCoordinates>> {
        self.batch(stack, z, Direction::LocalToWorld, records).await
    }

    /// Map an `(n, 2)` array of world points into the local space of `tile_id`.
    ///
    /// Fails with [`RenderError::NoTileMatch`](crate::RenderError::NoTileMatch)
    /// if any point does not fall into the tile.
    pub async fn world_to_local_coordinates_array(
        &self,
        stack: &str,
        points: ArrayView2<'_, f64>,
        tile_id: &str,
        z: f64,
        mode: &BatchMode,
    ) -> RenderResult<Array2<f64>> {
        let records = codec::package(points, tile_id, CoordinateSpace::World)?;

        let response = match mode {
            BatchMode::Server => {
                self.world_to_local_coordinates_batch(stack, z, &records)
                    .await?
            }
            #[cfg(feature = "client-side")]
            BatchMode::ClientSide(options) => {
                self.world_to_local_coordinates_clientside(stack, &records, z, options)
                    .await?
            }
        };

        codec::ensure_count(records.len(), response.len())
            .and_then(|()| codec::unpackage_world_to_local(&response, tile_id))
            .inspect_err(|err| {
                tracing::error!(%err, ?response, "Failed to unpack world-to-local response");
            })
    }

    /// Map an `(n, 2)` array of points local to `tile_id` into world space.
    pub async fn local_to_world_coordinates_array(
        &self,
        stack: &str,
        points: ArrayView2<'_, f64>,
        tile_id: &str,
        z: f64,
        mode: &BatchMode,
    ) -> RenderResult<Array2<f64>> {
        let records = codec::package(points, tile_id, CoordinateSpace::Local)?;

        let response = match mode {
            BatchMode::Server => {
                self.local_to_world_coordinates_batch(stack, z, &records)
                    .await?
            }
            #[cfg(feature = "client-side")]
            BatchMode::ClientSide(options) => {
                self.local_to_world_coordinates_clientside(stack, &records, z, options)
                    .await?
            }
        };

        codec::ensure_count(records.len(), response.len())
            .and_then(|()| codec::unpackage_local_to_world(&response))
            .inspect_err(|err| {
                tracing::error!(%err, ?response, "Failed to unpack local-to-world response");
            })
    }
}
