//! Conversion between `(n, 2)` point arrays and render-ws coordinate records.
//!
//! All functions preserve order and count: row `i` of an array corresponds to
//! record `i` of a request and to entry `i` of the matching response.

use super::{CoordinateSpace, Point, TileCoordinates};
use crate::{RenderError, RenderResult};
use ndarray::{Array2, ArrayView2};

fn ensure_point_shape(points: ArrayView2<'_, f64>) -> RenderResult<()> {
    match points.dim() {
        (_, 2) => Ok(()),
        (rows, cols) => Err(RenderError::InvalidShape { rows, cols }),
    }
}

pub(crate) fn ensure_count(expected: usize, actual: usize) -> RenderResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(RenderError::CountMismatch { expected, actual })
    }
}

/// Package an `(n, 2)` array into one record per row, all on `tile_id`,
/// with the point stored under the key of `space`.
pub fn package(
    points: ArrayView2<'_, f64>,
    tile_id: &str,
    space: CoordinateSpace,
) -> RenderResult<Vec<TileCoordinates>> {
    ensure_point_shape(points)?;

    points
        .rows()
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let point = [row[0], row[1]];
            if point.iter().all(|c| c.is_finite()) {
                Ok(TileCoordinates::new(tile_id, space, point))
            } else {
                Err(RenderError::NonFinitePoint { index })
            }
        })
        .collect()
}

/// Extract the `space` coordinates of each record into an `(n, 2)` array.
pub fn unpackage(records: &[TileCoordinates], space: CoordinateSpace) -> RenderResult<Array2<f64>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .coordinates(space)
                .ok_or(RenderError::MissingCoordinates { index, space })
        })
        .collect::<RenderResult<Vec<Point>>>()
        .map(Array2::from)
}

/// Unpack a local-to-world answer, one record per requested point.
pub fn unpackage_local_to_world(records: &[TileCoordinates]) -> RenderResult<Array2<f64>> {
    unpackage(records, CoordinateSpace::World)
}

/// Unpack a world-to-local answer, keeping for each point the local
/// coordinates of the candidate on `tile_id`.
pub fn unpackage_world_to_local(
    records: &[Vec<TileCoordinates>],
    tile_id: &str,
) -> RenderResult<Array2<f64>> {
    records
        .iter()
        .enumerate()
        .map(|(index, candidates)| {
            candidates
                .iter()
                .find(|candidate| candidate.tile_id.as_deref() == Some(tile_id))
                .ok_or_else(|| RenderError::NoTileMatch {
                    index,
                    tile_id: tile_id.to_owned(),
                })?
                .coordinates(CoordinateSpace::Local)
                .ok_or(RenderError::MissingCoordinates {
                    index,
                    space: CoordinateSpace::Local,
                })
        })
        .collect::<RenderResult<Vec<Point>>>()
        .map(Array2::from)
}
