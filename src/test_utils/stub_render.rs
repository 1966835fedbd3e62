//! In-process stand-in for render-ws.
//!
//! Tiles `A` and `B` are translations of the world frame. Every world point
//! falls into `B`; only points with non-negative x fall into `A`. Stack
//! `broken` answers with an HTML page and stack `missing` with a 404.

use crate::coordinate::{CoordinateSpace, Point, TileCoordinates};
#[cfg(feature = "pointmatch")]
use crate::pointmatch::{MatchCollectionId, MatchCollectionMeta, PointMatch};
use crate::{RenderClient, RenderConfig};
use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

pub(crate) const OWNER: &str = "flyTEM";
pub(crate) const PROJECT: &str = "FAFB00";

const TILE_OFFSETS: [(&str, Point); 2] = [("B", [1000.0, 2000.0]), ("A", [100.0, 200.0])];

type Params = Path<HashMap<String, String>>;
type Reply<T> = Result<Json<T>, Response>;

#[derive(Debug, Default)]
struct StubState {
    last_point: Mutex<Option<String>>,
    #[cfg(feature = "pointmatch")]
    matches: Mutex<Vec<(String, PointMatch)>>,
}

fn tile_offset(tile_id: &str) -> Option<Point> {
    TILE_OFFSETS
        .iter()
        .find(|&&(id, _)| id == tile_id)
        .map(|&(_, offset)| offset)
}

fn shifted(point: Point, offset: Point, sign: f64) -> Vec<f64> {
    vec![point[0] + sign * offset[0], point[1] + sign * offset[1]]
}

fn candidates(world: Point) -> Vec<TileCoordinates> {
    TILE_OFFSETS
        .iter()
        .filter(|&&(id, _)| id != "A" || world[0] >= 0.0)
        .map(|&(id, offset)| TileCoordinates {
            tile_id: Some(id.to_owned()),
            local: Some(shifted(world, offset, -1.0)),
            world: Some(world.to_vec()),
            visible: Some(true),
            error: None,
        })
        .collect()
}

fn to_world(record: &TileCoordinates) -> Result<TileCoordinates, Response> {
    let tile_id = record.tile_id.as_deref().unwrap_or_default();
    let offset = tile_offset(tile_id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("tile {tile_id} not found")).into_response())?;
    let local = record
        .coordinates(CoordinateSpace::Local)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "missing local").into_response())?;
    Ok(TileCoordinates {
        world: Some(shifted(local, offset, 1.0)),
        ..record.clone()
    })
}

fn parse_point(xy: &str) -> Option<Point> {
    let (x, y) = xy.split_once(',')?;
    Some([x.parse().ok()?, y.parse().ok()?])
}

fn check_scope(params: &HashMap<String, String>) -> Result<(), Response> {
    if params.get("owner").is_some_and(|owner| owner != OWNER)
        || params.get("project").is_some_and(|project| project != PROJECT)
    {
        return Err((StatusCode::NOT_FOUND, "unknown owner or project").into_response());
    }
    match params.get("stack").map(String::as_str) {
        Some("broken") => {
            Err((StatusCode::OK, "<html><body>Proxy error</body></html>").into_response())
        }
        Some("missing") => Err((StatusCode::NOT_FOUND, "stack not found").into_response()),
        _ => Ok(()),
    }
}

async fn world_to_local_point(
    State(state): State<Arc<StubState>>,
    Path(params): Params,
) -> Reply<Vec<TileCoordinates>> {
    check_scope(&params)?;
    let xy = &params["xy"];
    *state.last_point.lock().expect("lock poisoned") = Some(xy.clone());
    let world =
        parse_point(xy).ok_or_else(|| (StatusCode::BAD_REQUEST, "bad point").into_response())?;
    Ok(Json(candidates(world)))
}

async fn local_to_world_point(
    State(state): State<Arc<StubState>>,
    Path(params): Params,
) -> Reply<TileCoordinates> {
    check_scope(&params)?;
    let xy = &params["xy"];
    *state.last_point.lock().expect("lock poisoned") = Some(xy.clone());
    let local =
        parse_point(xy).ok_or_else(|| (StatusCode::BAD_REQUEST, "bad point").into_response())?;
    to_world(&TileCoordinates::new(
        params["tile"].as_str(),
        CoordinateSpace::Local,
        local,
    ))
    .map(Json)
}

async fn world_to_local_batch(
    Path(params): Params,
    Json(records): Json<Vec<TileCoordinates>>,
) -> Reply<Vec<Vec<TileCoordinates>>> {
    check_scope(&params)?;
    records
        .iter()
        .map(|record| {
            record
                .coordinates(CoordinateSpace::World)
                .map(candidates)
                .ok_or_else(|| (StatusCode::BAD_REQUEST, "missing world").into_response())
        })
        .collect::<Result<_, _>>()
        .map(Json)
}

async fn local_to_world_batch(
    Path(params): Params,
    Json(records): Json<Vec<TileCoordinates>>,
) -> Reply<Vec<TileCoordinates>> {
    check_scope(&params)?;
    records
        .iter()
        .map(to_world)
        .collect::<Result<_, _>>()
        .map(Json)
}

#[cfg(feature = "pointmatch")]
mod matches {
    use super::*;
    use std::collections::BTreeSet;

    fn select(
        state: &StubState,
        params: &HashMap<String, String>,
        keep: impl Fn(&PointMatch) -> bool,
    ) -> Reply<Vec<PointMatch>> {
        check_scope(params)?;
        let collection = &params["collection"];
        Ok(Json(
            state
                .matches
                .lock()
                .expect("lock poisoned")
                .iter()
                .filter(|(name, pair)| name == collection && keep(pair))
                .map(|(_, pair)| pair.clone())
                .collect(),
        ))
    }

    fn group_ids(
        state: &StubState,
        params: &HashMap<String, String>,
        sides: impl Fn(&PointMatch) -> Vec<&str>,
    ) -> Reply<BTreeSet<String>> {
        let pairs = select(state, params, |_| true)?.0;
        Ok(Json(
            pairs
                .iter()
                .flat_map(&sides)
                .map(str::to_owned)
                .collect(),
        ))
    }

    pub(super) async fn owners(State(state): State<Arc<StubState>>) -> Json<Vec<String>> {
        let has_matches = !state.matches.lock().expect("lock poisoned").is_empty();
        Json(if has_matches { vec![OWNER.to_owned()] } else { vec![] })
    }

    pub(super) async fn collections(
        State(state): State<Arc<StubState>>,
        Path(params): Params,
    ) -> Reply<Vec<MatchCollectionMeta>> {
        check_scope(&params)?;
        let mut counts = std::collections::BTreeMap::<String, u64>::new();
        for (name, _) in state.matches.lock().expect("lock poisoned").iter() {
            *counts.entry(name.clone()).or_default() += 1;
        }
        Ok(Json(
            counts
                .into_iter()
                .map(|(name, pair_count)| MatchCollectionMeta {
                    collection_id: MatchCollectionId {
                        owner: OWNER.to_owned(),
                        name,
                    },
                    pair_count,
                })
                .collect(),
        ))
    }

    pub(super) async fn import(
        State(state): State<Arc<StubState>>,
        Path(params): Params,
        Json(pairs): Json<Vec<PointMatch>>,
    ) -> Result<StatusCode, Response> {
        check_scope(&params)?;
        let collection = &params["collection"];
        state
            .matches
            .lock()
            .expect("lock poisoned")
            .extend(pairs.into_iter().map(|pair| (collection.clone(), pair)));
        Ok(StatusCode::CREATED)
    }

    pub(super) async fn all_group_ids(
        State(state): State<Arc<StubState>>,
        Path(params): Params,
    ) -> Reply<BTreeSet<String>> {
        group_ids(&state, &params, |pair| {
            vec![pair.p_group_id.as_str(), pair.q_group_id.as_str()]
        })
    }

    pub(super) async fn p_group_ids(
        State(state): State<Arc<StubState>>,
        Path(params): Params,
    ) -> Reply<BTreeSet<String>> {
        group_ids(&state, &params, |pair| vec![pair.p_group_id.as_str()])
    }

    pub(super) async fn q_group_ids(
        State(state): State<Arc<StubState>>,
        Path(params): Params,
    ) -> Reply<BTreeSet<String>> {
        group_ids(&state, &params, |pair| vec![pair.q_group_id.as_str()])
    }

    pub(super) async fn within_group(
        State(state): State<Arc<StubState>>,
        Path(params): Params,
    ) -> Reply<Vec<PointMatch>> {
        let group = params["group"].clone();
        select(&state, &params, |pair| {
            pair.p_group_id == group && pair.q_group_id == group
        })
    }

    pub(super) async fn outside_group(
        State(state): State<Arc<StubState>>,
        Path(params): Params,
    ) -> Reply<Vec<PointMatch>> {
        let group = params["group"].clone();
        select(&state, &params, |pair| {
            (pair.p_group_id == group) != (pair.q_group_id == group)
        })
    }

    fn between(pair: &PointMatch, p: &str, q: &str) -> bool {
        (pair.p_group_id == p && pair.q_group_id == q)
            || (pair.p_group_id == q && pair.q_group_id == p)
    }

    pub(super) async fn group_to_group(
        State(state): State<Arc<StubState>>,
        Path(params): Params,
    ) -> Reply<Vec<PointMatch>> {
        let (p, q) = (params["group"].clone(), params["other"].clone());
        select(&state, &params, |pair| between(pair, &p, &q))
    }

    pub(super) async fn delete_group_to_group(
        State(state): State<Arc<StubState>>,
        Path(params): Params,
    ) -> Result<StatusCode, Response> {
        check_scope(&params)?;
        let (collection, p, q) = (&params["collection"], &params["group"], &params["other"]);
        state
            .matches
            .lock()
            .expect("lock poisoned")
            .retain(|(name, pair)| name != collection || !between(pair, p, q));
        Ok(StatusCode::OK)
    }

    pub(super) async fn tile_to_tile(
        State(state): State<Arc<StubState>>,
        Path(params): Params,
    ) -> Reply<Vec<PointMatch>> {
        let key = |name: &str| params[name].clone();
        let (p, p_id, q, q_id) = (key("group"), key("id"), key("other"), key("other_id"));
        select(&state, &params, |pair| {
            pair.p_group_id == p && pair.p_id == p_id && pair.q_group_id == q && pair.q_id == q_id
        })
    }

    pub(super) async fn with_p_group(
        State(state): State<Arc<StubState>>,
        Path(params): Params,
    ) -> Reply<Vec<PointMatch>> {
        let group = params["group"].clone();
        select(&state, &params, |pair| pair.p_group_id == group)
    }

    pub(super) async fn involving_tile(
        State(state): State<Arc<StubState>>,
        Path(params): Params,
    ) -> Reply<Vec<PointMatch>> {
        let (group, id) = (params["group"].clone(), params["id"].clone());
        select(&state, &params, |pair| {
            (pair.p_group_id == group && pair.p_id == id)
                || (pair.q_group_id == group && pair.q_id == id)
        })
    }
}

fn router(state: Arc<StubState>) -> Router {
    const STACK: &str = "/render-ws/v1/owner/{owner}/project/{project}/stack/{stack}";

    let router = Router::new()
        .route(
            &format!("{STACK}/z/{{z}}/world-to-local-coordinates/{{xy}}"),
            get(world_to_local_point),
        )
        .route(
            &format!("{STACK}/tile/{{tile}}/local-to-world-coordinates/{{xy}}"),
            get(local_to_world_point),
        )
        .route(
            &format!("{STACK}/z/{{z}}/world-to-local-coordinates"),
            put(world_to_local_batch),
        )
        .route(
            &format!("{STACK}/z/{{z}}/local-to-world-coordinates"),
            put(local_to_world_batch),
        );

    #[cfg(feature = "pointmatch")]
    let router = {
        const COLLECTION: &str = "/render-ws/v1/owner/{owner}/matchCollection/{collection}";

        router
            .route("/render-ws/v1/matchCollectionOwners", get(matches::owners))
            .route(
                "/render-ws/v1/owner/{owner}/matchCollections",
                get(matches::collections),
            )
            .route(&format!("{COLLECTION}/matches"), put(matches::import))
            .route(&format!("{COLLECTION}/groupIds"), get(matches::all_group_ids))
            .route(&format!("{COLLECTION}/pGroupIds"), get(matches::p_group_ids))
            .route(&format!("{COLLECTION}/qGroupIds"), get(matches::q_group_ids))
            .route(
                &format!("{COLLECTION}/group/{{group}}/matchesWithinGroup"),
                get(matches::within_group),
            )
            .route(
                &format!("{COLLECTION}/group/{{group}}/matchesOutsideGroup"),
                get(matches::outside_group),
            )
            .route(
                &format!("{COLLECTION}/group/{{group}}/matchesWith/{{other}}"),
                get(matches::group_to_group).delete(matches::delete_group_to_group),
            )
            .route(
                &format!(
                    "{COLLECTION}/group/{{group}}/id/{{id}}/matchesWith/{{other}}/id/{{other_id}}"
                ),
                get(matches::tile_to_tile),
            )
            .route(
                &format!("{COLLECTION}/pGroup/{{group}}/matches/"),
                get(matches::with_p_group),
            )
            .route(
                &format!("{COLLECTION}/group/{{group}}/id/{{id}}/"),
                get(matches::involving_tile),
            )
    };

    router.with_state(state)
}

/// Stub server bound to an ephemeral local port, stopped on drop.
#[derive(Debug)]
pub(crate) struct StubRender {
    addr: SocketAddr,
    state: Arc<StubState>,
    task: JoinHandle<()>,
}

impl StubRender {
    pub(crate) async fn start() -> eyre::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(StubState::default());
        let app = router(Arc::clone(&state));

        let task = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                tracing::error!(%err, "Stub render-ws stopped");
            }
        });

        tracing::debug!(%addr, "Stub render-ws listening");

        Ok(Self { addr, state, task })
    }

    pub(crate) fn config(&self) -> RenderConfig {
        RenderConfig::new(
            self.addr.ip().to_string(),
            Some(self.addr.port()),
            OWNER,
            PROJECT,
        )
    }

    pub(crate) fn client(&self) -> RenderClient {
        RenderClient::new(self.config())
    }

    /// Raw `{x},{y}` path segment of the last single point lookup.
    pub(crate) fn last_point(&self) -> Option<String> {
        self.state.last_point.lock().expect("lock poisoned").clone()
    }
}

impl Drop for StubRender {
    fn drop(&mut self) {
        self.task.abort();
    }
}
