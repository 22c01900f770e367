//! Read-only dashboard snapshot endpoint.

use axum::Json;
use axum::extract::State;

use farmhub_app::ports::{ActionRecorder, CommandTransport};
use farmhub_app::snapshot::Snapshot;

use crate::state::AppState;

/// `GET /api/dashboard`
///
/// Serves the same view the WebSocket `get_initial_data` request returns,
/// for clients that only poll.
pub async fn handle<T, R>(State(state): State<AppState<T, R>>) -> Json<Snapshot>
where
    T: CommandTransport + Send + Sync + 'static,
    R: ActionRecorder + Send + Sync + 'static,
{
    Json(state.snapshot.snapshot())
}
