// ==============================================================================
// web server
// ==============================================================================
//
// routes:
//     GET /                      live dashboard (refreshes itself)
//     GET /history               table of the last 24 hours
//     GET /api/current           fresh reading, display-formatted json
//     GET /api/history/:hours    logged rows newer than now - hours, oldest first

use crate::config::DashboardConfig;
use crate::domain::{CurrentReading, SensorSnapshot};
use crate::station::Station;
use crate::templates;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Path, State},
    response::{Html, Json},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const HISTORY_PAGE_HOURS: u32 = 24;

/// shared between all handlers
#[derive(Clone)]
pub struct AppState {
    pub station: Station,
    pub dashboard: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(station: Station, dashboard: DashboardConfig) -> Self {
        Self { station, dashboard: Arc::new(dashboard) }
    }
}

pub fn router(state: AppState) -> Router {
    // the refresh script fetches whatever endpoint the layout is configured with
    let current_path = state.dashboard.endpoint.clone();
    let mut app = Router::new()
        .route("/", get(dashboard_handler))
        .route("/history", get(history_page_handler))
        .route("/api/current", get(current_handler))
        .route("/api/history/:hours", get(history_handler));
    if current_path.starts_with('/') && !["/", "/history", "/api/current"].contains(&current_path.as_str()) {
        app = app.route(&current_path, get(current_handler));
    }
    app.layer(CorsLayer::permissive()).with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind web server to {}", addr))?;
    tracing::info!("[WEB] ✓ Dashboard live at http://{}", addr);
    axum::serve(listener, router(state)).await.context("web server error")?;
    Ok(())
}

async fn dashboard_handler(State(state): State<AppState>) -> Html<String> {
    let reading = state.station.current_reading().await;
    Html(templates::dashboard(&reading, &state.dashboard))
}

async fn history_page_handler(State(state): State<AppState>) -> Html<String> {
    let rows = state.station.history(HISTORY_PAGE_HOURS).await;
    Html(templates::history(&rows, HISTORY_PAGE_HOURS))
}

/// json api endpoint polled by the dashboard
async fn current_handler(State(state): State<AppState>) -> Json<CurrentReading> {
    Json(state.station.current_reading().await)
}

async fn history_handler(State(state): State<AppState>, Path(hours): Path<u32>) -> Json<Vec<SensorSnapshot>> {
    Json(state.station.history(hours).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorsConfig;
    use crate::logger::WeatherLog;
    use crate::sensors::{MockSensors, SensorHub};

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state(dir: &tempfile::TempDir) -> AppState {
        let sensors = MockSensors::seeded(&SensorsConfig::default(), 7)
            .with_failure_rates(0.0, 0.0)
            .with_read_intervals(Duration::ZERO, Duration::ZERO);
        let station = Station::new(
            SensorHub::new(Box::new(sensors)),
            WeatherLog::new(dir.path().join("weather_log.csv")),
        );
        AppState::new(station, DashboardConfig::default())
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn current_returns_all_six_fields() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(router(state(&dir)), "/api/current").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        for field in ["timestamp", "temperature_dht", "temperature_bmp", "humidity", "pressure", "altitude"] {
            assert!(json[field].is_string(), "missing {}", field);
        }
        assert!(json["pressure"].as_str().unwrap().ends_with("hPa"));
    }

    #[tokio::test]
    async fn history_is_empty_without_a_log() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(router(state(&dir)), "/api/history/24").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn history_returns_logged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        state.station.log_once().await.unwrap();
        state.station.log_once().await.unwrap();

        let (_, body) = get(router(state), "/api/history/1").await;
        let rows: Vec<SensorSnapshot> = serde_json::from_str(&body).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].timestamp <= rows[1].timestamp);
    }

    #[tokio::test]
    async fn bad_hours_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = get(router(state(&dir)), "/api/history/lots").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn pages_render() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state(&dir));

        let (status, html) = get(app.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(r#"class="dashboard""#));
        assert!(html.contains("setInterval(updateReadings, REFRESH_MS)"));

        let (status, html) = get(app, "/history").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Weather History"));
    }
}
