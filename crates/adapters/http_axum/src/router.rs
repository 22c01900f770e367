//! Axum router assembly.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use farmhub_app::ports::{ActionRecorder, CommandTransport};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Exposes the command gateway at `/control/{target}`, the observer
/// WebSocket at `/ws`, and a read-only snapshot at `/api/dashboard`.
/// Includes a [`TraceLayer`] that logs each HTTP
/// request/response at the `DEBUG` level using the `tracing` ecosystem.
pub fn build<T, R>(state: AppState<T, R>) -> Router
where
    T: CommandTransport + Send + Sync + 'static,
    R: ActionRecorder + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/dashboard", get(crate::api::dashboard::handle))
        .route("/control/{target}", post(crate::api::control::handle))
        .route("/ws", get(crate::api::ws::upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use farmhub_app::broadcaster::Broadcaster;
    use farmhub_app::correlation::CorrelationEngine;
    use farmhub_app::ports::InboundMessage;
    use farmhub_app::registry::DeviceRegistry;
    use farmhub_app::snapshot::SnapshotState;
    use farmhub_domain::command::Confirmation;
    use farmhub_domain::device::{DeviceName, DeviceState};
    use farmhub_domain::error::FarmHubError;
    use farmhub_domain::id::CorrelationId;

    use super::*;

    struct SilentTransport;

    impl CommandTransport for SilentTransport {
        fn publish(
            &self,
            _topic: &str,
            _payload: Vec<u8>,
        ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
            async { Ok(()) }
        }
    }

    /// Forwards every published payload to a channel so the test can echo
    /// a confirmation back through the engine.
    struct ChannelTransport {
        tx: mpsc::UnboundedSender<Vec<u8>>,
    }

    impl CommandTransport for ChannelTransport {
        fn publish(
            &self,
            _topic: &str,
            payload: Vec<u8>,
        ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
            let _ = self.tx.send(payload);
            async { Ok(()) }
        }
    }

    struct StubRecorder;

    impl ActionRecorder for StubRecorder {
        fn record_action(
            &self,
            _target: &DeviceName,
            _action: &str,
            _state: DeviceState,
        ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
            async { Ok(()) }
        }

        fn record_reading(
            &self,
            _sensor: &str,
            _value: f64,
        ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
            async { Ok(()) }
        }
    }

    fn test_state<T>(transport: T, timeout: Duration) -> AppState<T, StubRecorder>
    where
        T: CommandTransport + Send + Sync + 'static,
    {
        let broadcaster = Arc::new(Broadcaster::new(16));
        let snapshot = Arc::new(SnapshotState::default());
        let engine = Arc::new(CorrelationEngine::new(
            transport,
            StubRecorder,
            Arc::clone(&broadcaster),
            Arc::clone(&snapshot),
        ));
        let registry = Arc::new(DeviceRegistry::new([
            DeviceName::new("cooling-fan").unwrap(),
        ]));
        AppState::new(engine, broadcaster, snapshot, registry).with_command_timeout(timeout)
    }

    fn control_request(target: &str, action: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/control/{target}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(r#"{{"action":"{action}"}}"#)))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(test_state(SilentTransport, Duration::from_millis(50)));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_serve_current_snapshot_on_dashboard() {
        let state = test_state(SilentTransport, Duration::from_millis(50));
        state
            .snapshot
            .record_reading("temperature", 21.5, chrono::Utc::now());
        state
            .snapshot
            .record_device_state(&DeviceName::new("cooling-fan").unwrap(), DeviceState::On);
        let app = build(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(
            (body["sensors"]["temperature"]["value"].as_f64().unwrap() - 21.5).abs()
                < f64::EPSILON
        );
        assert_eq!(body["devices"]["cooling-fan"], "on");
    }

    #[tokio::test]
    async fn should_reject_unknown_target_with_not_found() {
        let app = build(test_state(SilentTransport, Duration::from_millis(50)));

        let response = app
            .oneshot(control_request("heater", "turn_on"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "unknown target device: heater");
    }

    #[tokio::test]
    async fn should_reject_unknown_action_with_bad_request() {
        let app = build(test_state(SilentTransport, Duration::from_millis(50)));

        let response = app
            .oneshot(control_request("cooling-fan", "explode"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "unknown control action: explode");
    }

    #[tokio::test]
    async fn should_reject_invalid_device_name_with_bad_request() {
        let app = build(test_state(SilentTransport, Duration::from_millis(50)));

        let response = app
            .oneshot(control_request("Fan%20One", "turn_on"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_answer_timeout_with_forced_off_body() {
        let app = build(test_state(SilentTransport, Duration::from_millis(50)));

        let response = app
            .oneshot(control_request("cooling-fan", "turn_on"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "timeout");
        assert_eq!(body["status"], "off");
        assert!(body["correlationId"].is_string());
    }

    #[tokio::test]
    async fn should_answer_ok_when_confirmation_arrives() {
        let (tx, mut published) = mpsc::unbounded_channel();
        let state = test_state(ChannelTransport { tx }, Duration::from_secs(5));
        let engine = Arc::clone(&state.engine);
        let app = build(state);

        // Echo a successful confirmation for whatever command gets issued.
        tokio::spawn(async move {
            let payload = published.recv().await.unwrap();
            let command: serde_json::Value = serde_json::from_slice(&payload).unwrap();
            let correlation_id: CorrelationId =
                command["correlationId"].as_str().unwrap().parse().unwrap();
            engine
                .handle_inbound(InboundMessage::StatusConfirmation {
                    device: DeviceName::new("cooling-fan").unwrap(),
                    confirmation: Confirmation {
                        correlation_id,
                        result_state: DeviceState::On,
                        success: true,
                    },
                })
                .await;
        });

        let response = app
            .oneshot(control_request("cooling-fan", "turn_on"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "on");
        assert!(body["correlationId"].is_string());
    }
}
