//! End-to-end smoke tests for the full homedashd stack.
//!
//! Each test spins up a small in-memory stand-in for the REST service on a
//! local port and drives the real services through the real HTTP gateway.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::FixedOffset;
use homedash_adapter_gateway_http::{GatewayConfig, HttpGateway};
use homedash_app::services::{
    DeviceControls, DeviceControlsOptions, IntegrationCatalog, SessionService, TaskRegistry,
};
use homedash_domain::device::{Brightness, DeviceStatus, DeviceType};
use homedash_domain::session::SessionContext;
use homedash_domain::task::{TaskAction, TaskForm};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::sleep;

#[derive(Default)]
struct Service {
    devices: Vec<Value>,
    tasks: Vec<Value>,
    brightness_writes: Vec<u64>,
    logouts: usize,
}

type Shared = Arc<Mutex<Service>>;

#[derive(Deserialize)]
struct SessionQuery {
    session_id: Option<String>,
}

fn check(query: &SessionQuery) -> Result<(), Response> {
    if query.session_id.as_deref() == Some("s1") {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid session. Please login."})),
        )
            .into_response())
    }
}

async fn login(Json(body): Json<Value>) -> Json<Value> {
    let accepted = body["username"] == "admin" && body["password"] == "password123";
    let message = if accepted {
        "Login successful"
    } else {
        "Invalid username or password"
    };
    Json(json!({
        "success": accepted,
        "message": message,
        "user_id": accepted.then_some("u1"),
        "session_id": accepted.then_some("s1"),
    }))
}

async fn logout(State(state): State<Shared>, Query(query): Query<SessionQuery>) -> Response {
    if let Err(rejected) = check(&query) {
        return rejected;
    }
    state.lock().unwrap().logouts += 1;
    Json(json!({"success": true, "message": "Logged out"})).into_response()
}

async fn list_devices(State(state): State<Shared>, Query(query): Query<SessionQuery>) -> Response {
    if let Err(rejected) = check(&query) {
        return rejected;
    }
    Json(state.lock().unwrap().devices.clone()).into_response()
}

async fn create_device(
    State(state): State<Shared>,
    Query(query): Query<SessionQuery>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejected) = check(&query) {
        return rejected;
    }
    let mut state = state.lock().unwrap();
    let device = json!({
        "device_id": format!("device-{}", state.devices.len() + 1),
        "device_type": body["device_type"],
        "device_name": body["device_name"],
        "status": "off",
    });
    state.devices.push(device.clone());
    Json(device).into_response()
}

async fn set_brightness(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Query(query): Query<SessionQuery>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejected) = check(&query) {
        return rejected;
    }
    let level = body["brightness"].as_u64().unwrap_or_default();
    let mut state = state.lock().unwrap();
    state.brightness_writes.push(level);
    let Some(device) = state.devices.iter_mut().find(|d| d["device_id"] == id) else {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Device not found"}))).into_response();
    };
    device["brightness"] = json!(level);
    if level > 0 {
        device["is_on"] = json!(true);
        device["status"] = json!("on");
    }
    Json(device.clone()).into_response()
}

async fn list_tasks(State(state): State<Shared>, Query(query): Query<SessionQuery>) -> Response {
    if let Err(rejected) = check(&query) {
        return rejected;
    }
    Json(state.lock().unwrap().tasks.clone()).into_response()
}

async fn create_task(
    State(state): State<Shared>,
    Query(query): Query<SessionQuery>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejected) = check(&query) {
        return rejected;
    }
    let mut state = state.lock().unwrap();
    let task = json!({
        "task_id": format!("task-{}", state.tasks.len() + 1),
        "device_id": body["device_id"],
        "action": body["action"],
        "scheduled_time": body["scheduled_time"],
        "executed": false,
    });
    state.tasks.push(task.clone());
    Json(task).into_response()
}

async fn list_integrations(Query(query): Query<SessionQuery>) -> Response {
    if let Err(rejected) = check(&query) {
        return rejected;
    }
    Json(json!([
        {"name": "Amazon Alexa", "status": "active", "connected": true},
        {"name": "Google Home", "status": "inactive", "connected": false}
    ]))
    .into_response()
}

async fn integration_stats() -> Json<Value> {
    Json(json!({"connected_count": 1, "total_count": 2}))
}

async fn start() -> (Shared, Arc<HttpGateway>) {
    let state = Shared::default();
    let router = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/devices", get(list_devices).post(create_device))
        .route("/devices/{id}/light/brightness", put(set_brightness))
        .route("/schedule", get(list_tasks).post(create_task))
        .route("/integrations", get(list_integrations))
        .route("/integrations/stats", get(integration_stats))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let gateway = HttpGateway::new(&GatewayConfig {
        base_url: format!("http://{addr}"),
        request_timeout_secs: 5,
    })
    .unwrap();
    (state, Arc::new(gateway))
}

async fn login_as_admin(gateway: &Arc<HttpGateway>) -> SessionContext {
    SessionService::new(Arc::clone(gateway))
        .login("admin", "password123")
        .await
        .unwrap()
}

#[tokio::test]
async fn should_reject_wrong_password_with_server_message() {
    let (_state, gateway) = start().await;

    let err = SessionService::new(gateway)
        .login("admin", "wrong")
        .await
        .unwrap_err();

    assert_eq!(
        err.display_message("Login failed"),
        "Invalid username or password"
    );
}

#[tokio::test]
async fn should_create_light_and_apply_brightness_over_http() {
    let (state, gateway) = start().await;
    let session = login_as_admin(&gateway).await;
    let controls = DeviceControls::mount(
        Arc::clone(&gateway),
        session,
        DeviceControlsOptions {
            poll_interval: Duration::from_millis(50),
            debounce: Duration::from_millis(30),
        },
    );
    // let the initial poll land first
    sleep(Duration::from_millis(100)).await;

    let created = controls.create_device(DeviceType::Light, "Lamp").await.unwrap();
    let view = controls.views().into_iter().next().unwrap();
    assert_eq!(view.device.id, created.id);
    assert_eq!(view.device.status, DeviceStatus::Off);
    assert!(view.device.brightness.is_none());

    for level in [10, 40, 70] {
        controls.set_brightness(&created.id, Brightness::new(level).unwrap());
    }
    assert_eq!(controls.views()[0].brightness, Brightness::new(70).unwrap());

    sleep(Duration::from_millis(300)).await;

    assert_eq!(state.lock().unwrap().brightness_writes, vec![70]);
    let view = &controls.views()[0];
    assert!(view.is_on);
    assert_eq!(view.brightness, Brightness::new(70).unwrap());
    assert!(!view.is_pending);
    controls.shutdown();
}

#[tokio::test]
async fn should_schedule_task_at_absolute_instant_over_http() {
    let (state, gateway) = start().await;
    let session = login_as_admin(&gateway).await;
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let registry = TaskRegistry::mount(
        Arc::clone(&gateway),
        session,
        Duration::from_secs(60),
        plus_two,
    );
    sleep(Duration::from_millis(100)).await;

    registry
        .schedule(TaskForm {
            device_id: "d1".to_string(),
            action: Some(TaskAction::TurnOn),
            date: "2025-01-01".to_string(),
            time: "08:00".to_string(),
            brightness: None,
        })
        .await
        .unwrap();

    assert_eq!(
        state.lock().unwrap().tasks[0]["scheduled_time"],
        "2025-01-01T06:00:00.000Z"
    );
    let views = registry.views(&[]);
    assert_eq!(views.len(), 1);
    assert!(!views[0].executed);
    assert_eq!(views[0].device_name, "d1");
    registry.shutdown();
}

#[tokio::test]
async fn should_load_integration_catalog_with_stats() {
    let (_state, gateway) = start().await;
    let session = login_as_admin(&gateway).await;
    let catalog = IntegrationCatalog::new(Arc::clone(&gateway), session);

    catalog.refresh().await;

    let snapshot = catalog.snapshot();
    assert_eq!(snapshot.integrations.items().len(), 2);
    assert_eq!(snapshot.stats.connected_count, 1);
    assert!(snapshot.integrations.last_error().is_none());
}

#[tokio::test]
async fn should_log_out_through_gateway() {
    let (state, gateway) = start().await;
    let session = login_as_admin(&gateway).await;

    SessionService::new(gateway).logout(session).await;

    assert_eq!(state.lock().unwrap().logouts, 1);
}
