//! Command gateway handler.
//!
//! Turns the fire-and-forget pub/sub exchange into a synchronous HTTP
//! request/response: the handler blocks (bounded by the configured timeout)
//! until the actuator confirms, and answers `408` with a forced-off status
//! when it never does.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use farmhub_app::ports::{ActionRecorder, CommandTransport};
use farmhub_domain::device::{DeviceName, DeviceState};
use farmhub_domain::error::{FarmHubError, ValidationError};
use farmhub_domain::id::CorrelationId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `POST /control/{target}`.
#[derive(Deserialize)]
pub struct ControlRequest {
    pub action: String,
}

/// `200` body: the actuator confirmed within the budget.
#[derive(Serialize)]
pub struct ConfirmedBody {
    pub success: bool,
    pub status: DeviceState,
    #[serde(rename = "correlationId")]
    pub correlation_id: CorrelationId,
}

/// `408` body: no confirmation arrived; the device is treated as OFF.
#[derive(Serialize)]
pub struct TimedOutBody {
    pub success: bool,
    pub error: &'static str,
    pub status: DeviceState,
    #[serde(rename = "correlationId")]
    pub correlation_id: CorrelationId,
}

/// Possible responses from the control endpoint.
pub enum ControlResponse {
    Confirmed(Json<ConfirmedBody>),
    TimedOut(Json<TimedOutBody>),
}

impl IntoResponse for ControlResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Confirmed(json) => json.into_response(),
            Self::TimedOut(json) => (StatusCode::REQUEST_TIMEOUT, json).into_response(),
        }
    }
}

/// `POST /control/{target}`
pub async fn handle<T, R>(
    State(state): State<AppState<T, R>>,
    Path(target): Path<String>,
    Json(req): Json<ControlRequest>,
) -> Result<ControlResponse, ApiError>
where
    T: CommandTransport + Send + Sync + 'static,
    R: ActionRecorder + Send + Sync + 'static,
{
    let target = DeviceName::from_str(&target).map_err(FarmHubError::Validation)?;
    state
        .registry
        .ensure_known(&target)
        .map_err(FarmHubError::UnknownTarget)?;

    let desired_state = match req.action.as_str() {
        "turn_on" => DeviceState::On,
        "turn_off" => DeviceState::Off,
        other => {
            return Err(FarmHubError::Validation(ValidationError::UnknownAction(
                other.to_string(),
            ))
            .into());
        }
    };

    match state
        .engine
        .issue(&target, desired_state, state.command_timeout)
        .await
    {
        Ok(confirmation) => Ok(ControlResponse::Confirmed(Json(ConfirmedBody {
            success: confirmation.success,
            status: confirmation.result_state,
            correlation_id: confirmation.correlation_id,
        }))),
        Err(FarmHubError::Timeout(err)) => Ok(ControlResponse::TimedOut(Json(TimedOutBody {
            success: false,
            error: "timeout",
            status: DeviceState::Off,
            correlation_id: err.correlation_id,
        }))),
        Err(other) => Err(other.into()),
    }
}
