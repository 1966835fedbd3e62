/*!
Point match collections.

A match collection stores, for pairs of tiles, corresponding points found by
feature matching. Pairs are addressed by section group id (`pGroupId`,
`qGroupId`) and tile id (`pId`, `qId`); all requests are scoped to the owner
of the client's [`RenderConfig`](crate::RenderConfig).
*/

use crate::client::Action;
use crate::coordinate::Point;
use crate::{RenderClient, RenderError, RenderResult};
use ndarray::{Array2, ArrayView2};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Corresponding points between two tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointMatch {
    /// Section of the first tile.
    pub p_group_id: String,
    /// First tile.
    pub p_id: String,
    /// Section of the second tile.
    pub q_group_id: String,
    /// Second tile.
    pub q_id: String,
    /// Matched points.
    pub matches: Matches,
}

/// Matched points in render's column layout: `p[0]` holds all x values of the
/// first tile, `p[1]` all y values, likewise for `q`; `w` holds weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Matches {
    /// Local points in the first tile.
    pub p: [Vec<f64>; 2],
    /// Local points in the second tile.
    pub q: [Vec<f64>; 2],
    /// Weight of each correspondence.
    pub w: Vec<f64>,
}

fn to_rows(columns: &[Vec<f64>; 2]) -> Array2<f64> {
    Array2::from(
        columns[0]
            .iter()
            .zip(&columns[1])
            .map(|(&x, &y)| [x, y])
            .collect::<Vec<Point>>(),
    )
}

fn to_columns(points: ArrayView2<'_, f64>) -> [Vec<f64>; 2] {
    [points.column(0).to_vec(), points.column(1).to_vec()]
}

impl Matches {
    /// Build from `(n, 2)` arrays of corresponding points and `n` weights.
    pub fn from_points(
        p: ArrayView2<'_, f64>,
        q: ArrayView2<'_, f64>,
        w: Vec<f64>,
    ) -> RenderResult<Self> {
        for points in [p, q] {
            let (rows, cols) = points.dim();
            if cols != 2 {
                return Err(RenderError::InvalidShape { rows, cols });
            }
            if rows != w.len() {
                return Err(RenderError::CountMismatch {
                    expected: w.len(),
                    actual: rows,
                });
            }
        }
        Ok(Self {
            p: to_columns(p),
            q: to_columns(q),
            w,
        })
    }

    /// Number of correspondences.
    pub fn len(&self) -> usize {
        self.w.len()
    }

    /// Whether there are no correspondences.
    pub fn is_empty(&self) -> bool {
        self.w.is_empty()
    }

    /// Points in the first tile as an `(n, 2)` array.
    pub fn p_points(&self) -> Array2<f64> {
        to_rows(&self.p)
    }

    /// Points in the second tile as an `(n, 2)` array.
    pub fn q_points(&self) -> Array2<f64> {
        to_rows(&self.q)
    }
}

/// Identifier of a match collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchCollectionId {
    /// Owner of the collection.
    pub owner: String,
    /// Collection name.
    pub name: String,
}

/// Summary of a match collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCollectionMeta {
    /// Identifier of the collection.
    pub collection_id: MatchCollectionId,
    /// Number of tile pairs stored.
    #[serde(default)]
    pub pair_count: u64,
}

impl RenderClient {
    fn collection_url<'seg>(
        &'seg self,
        collection: &'seg str,
        segments: impl IntoIterator<Item = &'seg str>,
    ) -> RenderResult<Url> {
        let config = self.config();
        config.url(
            [
                "owner",
                config.owner.as_str(),
                "matchCollection",
                collection,
            ]
            .into_iter()
            .chain(segments),
        )
    }

    /// Owners having at least one match collection.
    pub async fn match_collection_owners(&self) -> RenderResult<Vec<String>> {
        self.get(self.config().url(["matchCollectionOwners"])?).await
    }

    /// Match collections of the configured owner.
    pub async fn match_collections(&self) -> RenderResult<Vec<MatchCollectionMeta>> {
        let config = self.config();
        self.get(config.url(["owner", config.owner.as_str(), "matchCollections"])?)
            .await
    }

    /// Group ids appearing on either side of any pair.
    pub async fn match_group_ids(&self, collection: &str) -> RenderResult<Vec<String>> {
        self.get(self.collection_url(collection, ["groupIds"])?)
            .await
    }

    /// Group ids appearing as `pGroupId`.
    pub async fn match_p_group_ids(&self, collection: &str) -> RenderResult<Vec<String>> {
        self.get(self.collection_url(collection, ["pGroupIds"])?)
            .await
    }

    /// Group ids appearing as `qGroupId`.
    pub async fn match_q_group_ids(&self, collection: &str) -> RenderResult<Vec<String>> {
        self.get(self.collection_url(collection, ["qGroupIds"])?)
            .await
    }

    /// Pairs with exactly one tile in `group_id`.
    pub async fn matches_outside_group(
        &self,
        collection: &str,
        group_id: &str,
    ) -> RenderResult<Vec<PointMatch>> {
        self.get(self.collection_url(collection, ["group", group_id, "matchesOutsideGroup"])?)
            .await
    }

    /// Pairs with both tiles in `group_id`.
    pub async fn matches_within_group(
        &self,
        collection: &str,
        group_id: &str,
    ) -> RenderResult<Vec<PointMatch>> {
        self.get(self.collection_url(collection, ["group", group_id, "matchesWithinGroup"])?)
            .await
    }

    /// Pairs between tiles of `p_group_id` and tiles of `q_group_id`.
    pub async fn matches_from_group_to_group(
        &self,
        collection: &str,
        p_group_id: &str,
        q_group_id: &str,
    ) -> RenderResult<Vec<PointMatch>> {
        self.get(self.collection_url(
            collection,
            ["group", p_group_id, "matchesWith", q_group_id],
        )?)
        .await
    }

    /// Pairs between two specific tiles.
    pub async fn matches_from_tile_to_tile(
        &self,
        collection: &str,
        p_group_id: &str,
        p_id: &str,
        q_group_id: &str,
        q_id: &str,
    ) -> RenderResult<Vec<PointMatch>> {
        self.get(self.collection_url(
            collection,
            [
                "group",
                p_group_id,
                "id",
                p_id,
                "matchesWith",
                q_group_id,
                "id",
                q_id,
            ],
        )?)
        .await
    }

    /// Pairs whose `pGroupId` is `p_group_id`.
    pub async fn matches_with_group(
        &self,
        collection: &str,
        p_group_id: &str,
    ) -> RenderResult<Vec<PointMatch>> {
        // render-ws only routes this endpoint with the trailing slash
        self.get(self.collection_url(collection, ["pGroup", p_group_id, "matches", ""])?)
            .await
    }

    /// Pairs involving the tile `p_id` of `p_group_id` on either side.
    pub async fn matches_involving_tile(
        &self,
        collection: &str,
        p_group_id: &str,
        p_id: &str,
    ) -> RenderResult<Vec<PointMatch>> {
        self.get(self.collection_url(collection, ["group", p_group_id, "id", p_id, ""])?)
            .await
    }

    /// Delete all pairs between `p_group_id` and `q_group_id`.
    pub async fn delete_point_matches_between_groups(
        &self,
        collection: &str,
        p_group_id: &str,
        q_group_id: &str,
    ) -> RenderResult {
        let url = self.collection_url(
            collection,
            ["group", p_group_id, "matchesWith", q_group_id],
        )?;
        self.request::<()>(Action::DELETE, url).await
    }

    /// Store `matches` in `collection`, creating it if needed.
    pub async fn import_matches(&self, collection: &str, matches: &[PointMatch]) -> RenderResult {
        let url = self.collection_url(collection, ["matches"])?;
        tracing::debug!(%url, count = matches.len(), "Importing point matches");
        self.request::<()>(Action::Put(matches), url).await
    }
}
