//! REST API for the truck load planner.
//!
//! Provides HTTP endpoints for the loading-plan frontend.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::catalog::{self, BoxType};
use crate::config::{ApiConfig, LayoutSettings, PackingServiceConfig};
use crate::load_order::DisplayGroup;
use crate::model::{BoxItem, PackedBox, Placement, Stack, StackedBox, TruckBed};
use crate::orders::{self, OrderCsvError};
use crate::packing_client::{PackingClient, PackingClientError};
use crate::planner::{
    LayoutConfig, LayoutError, LayoutPlan, boxes_from_json, plan_layout,
    plan_layout_with_progress,
};
use crate::types::{BoxColor, Footprint};

#[derive(Clone)]
struct ApiState {
    layout_settings: LayoutSettings,
    packing_client: PackingClient,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>truck-load-planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Embedded Web Assets (HTML, CSS, JS)
#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// Request structure for the layout endpoints.
///
/// `boxes` must be a JSON array; anything else is rejected as invalid input.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "boxes": [
            {
                "box_id": 1,
                "customer_id": 1001,
                "box_type_id": 1,
                "items": [{ "product_name": "Rice 5kg", "quantity": 2 }],
                "total_weight": 10.0,
                "customer_order": 1
            }
        ],
        "bed_width": 200
    })
)]
pub struct LayoutRequest {
    #[serde(default)]
    #[schema(value_type = Vec<PackedBox>)]
    pub boxes: serde_json::Value,
    #[serde(default)]
    #[schema(nullable = true)]
    pub bed_width: Option<u32>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub bed_length: Option<u32>,
}

#[derive(Debug)]
struct ValidatedLayoutRequest {
    boxes: Vec<PackedBox>,
    config: LayoutConfig,
}

impl LayoutRequest {
    fn into_validated(self, base: LayoutConfig) -> Result<ValidatedLayoutRequest, LayoutError> {
        let config = base.with_overrides(self.bed_width, self.bed_length)?;
        let boxes = boxes_from_json(self.boxes)?;
        Ok(ValidatedLayoutRequest { boxes, config })
    }
}

/// A non-fatal layout problem in the response.
#[derive(Serialize, ToSchema)]
pub struct LayoutWarningEntry {
    pub stack_index: usize,
    pub code: String,
    pub message: String,
}

/// Response structure with the complete loading plan.
///
/// # Fields
/// * `placements` - Stacks with their bed coordinates, in load order
/// * `display_groups` - Stacks ordered rear to front for display
/// * `warnings` - Placements that exceed the bed
#[derive(Serialize, ToSchema)]
pub struct LayoutResponse {
    pub bed: TruckBed,
    pub box_count: usize,
    pub stack_count: usize,
    pub used_length: u32,
    pub is_within_bed: bool,
    pub placements: Vec<Placement>,
    pub display_groups: Vec<DisplayGroup>,
    pub warnings: Vec<LayoutWarningEntry>,
}

impl LayoutResponse {
    /// Creates a LayoutResponse from a LayoutPlan.
    pub fn from_plan(plan: LayoutPlan, bed: TruckBed) -> Self {
        let box_count = plan.box_count();
        let stack_count = plan.stack_count();
        let used_length = plan.used_length();
        let is_within_bed = plan.is_within_bed();
        let LayoutPlan {
            placements,
            display_groups,
            warnings,
        } = plan;

        Self {
            bed,
            box_count,
            stack_count,
            used_length,
            is_within_bed,
            placements,
            display_groups,
            warnings: warnings
                .into_iter()
                .map(|w| LayoutWarningEntry {
                    stack_index: w.stack_index(),
                    code: w.code().to_string(),
                    message: w.to_string(),
                })
                .collect(),
        }
    }
}

/// Response of the order-file endpoint.
#[derive(Serialize, ToSchema)]
pub struct PlanResponse {
    pub order_item_count: usize,
    pub customer_count: usize,
    pub layout: LayoutResponse,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn layout_error(err: LayoutError) -> Response {
    let error = match err {
        LayoutError::InvalidBed(_) => "Invalid truck bed",
        LayoutError::InvalidInput(_)
        | LayoutError::UnreadableBox { .. }
        | LayoutError::InvalidBox { .. } => "Invalid input data",
    };
    error_response(StatusCode::UNPROCESSABLE_ENTITY, error, err.to_string())
}

fn order_file_error(err: OrderCsvError) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid order file",
        err.to_string(),
    )
}

fn packing_service_error(err: PackingClientError) -> Response {
    let error = match err {
        PackingClientError::InvalidBox { .. } => "Invalid packing result",
        PackingClientError::Request(_) | PackingClientError::Status { .. } => {
            "Packing service unavailable"
        }
    };
    error_response(StatusCode::BAD_GATEWAY, error, err.to_string())
}

fn parse_layout_request(
    payload: Result<Json<LayoutRequest>, JsonRejection>,
    base: LayoutConfig,
) -> Result<ValidatedLayoutRequest, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    payload.into_validated(base).map_err(layout_error)
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_layout, handle_layout_stream, handle_plan, handle_box_types),
    components(
        schemas(
            LayoutRequest,
            LayoutResponse,
            LayoutWarningEntry,
            PlanResponse,
            ErrorResponse,
            PackedBox,
            BoxItem,
            StackedBox,
            Stack,
            Placement,
            DisplayGroup,
            TruckBed,
            BoxType,
            BoxColor,
            Footprint
        )
    ),
    tags((name = "layout", description = "Endpoints for truck loading plans"))
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        // API endpoints
        .route("/layout", post(handle_layout))
        .route("/layout_stream", post(handle_layout_stream))
        .route("/plan", post(handle_plan))
        .route("/box-types", get(handle_box_types))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        // Web-UI (embedded)
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_static))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Configures CORS for cross-origin requests from the frontend.
/// Blocks until the server is terminated.
pub async fn start_api_server(
    config: ApiConfig,
    layout_settings: LayoutSettings,
    packing_config: PackingServiceConfig,
) {
    let packing_client = match PackingClient::new(&packing_config) {
        Ok(client) => client,
        Err(err) => {
            log::error!("❌ Could not create packing service client: {err}");
            return;
        }
    };

    log::info!("🔗 Packing service: {}", packing_client.endpoint());
    let state = ApiState {
        layout_settings,
        packing_client,
    };
    let app = router(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            log::error!("❌ Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    let display_host = config.display_host().to_string();
    log::info!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        log::info!("💡 Local access: http://localhost:{}", config.port());
    }
    log::info!("📦 API Endpoints:");
    log::info!("   - POST /layout");
    log::info!("   - POST /layout_stream");
    log::info!("   - POST /plan");
    log::info!("   - GET /box-types");
    log::info!("📑 Documentation:");
    log::info!("   - GET /docs");
    log::info!("   - GET /docs/openapi.json");
    log::info!("🌐 Web-UI: http://{}:{}", display_host, config.port());

    if let Err(err) = axum::serve(listener, app).await {
        log::error!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /layout endpoint.
///
/// Stacks the given boxes, places the stacks on the truck bed and returns the
/// plan together with the rear-to-front display order.
#[utoipa::path(
    post,
    path = "/layout",
    request_body = LayoutRequest,
    responses(
        (status = 200, description = "Loading plan computed", body = LayoutResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid boxes or truck bed",
            body = ErrorResponse
        )
    ),
    tag = "layout"
)]
async fn handle_layout(
    State(state): State<ApiState>,
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_layout_request(payload, state.layout_settings.layout_config()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let ValidatedLayoutRequest { boxes, config } = request;
    log::info!(
        "📥 New layout request: {} boxes, bed {}×{} cm",
        boxes.len(),
        config.bed.width,
        config.bed.length
    );
    let plan = plan_layout(boxes, &config);
    if plan.is_empty() {
        log::info!("📭 No boxes to load");
    } else {
        log::info!(
            "🚚 Result: {} stacks, {} warnings",
            plan.stack_count(),
            plan.warnings.len()
        );
    }

    let response = LayoutResponse::from_plan(plan, config.bed);
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /layout_stream endpoint (SSE).
///
/// Streams plan events in real-time as Server-Sent Events (text/event-stream).
#[utoipa::path(
    post,
    path = "/layout_stream",
    request_body = LayoutRequest,
    responses(
        (
            status = 200,
            description = "Streams plan events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid boxes or truck bed",
            body = ErrorResponse
        )
    ),
    tag = "layout"
)]
async fn handle_layout_stream(
    State(state): State<ApiState>,
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_layout_request(payload, state.layout_settings.layout_config()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let ValidatedLayoutRequest { boxes, config } = request;
    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        let _ = plan_layout_with_progress(boxes, &config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver means the client went away; later events are dropped.
                let _ = tx.blocking_send(json);
            }
        });
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /plan endpoint.
///
/// Takes the order matrix as CSV, lets the packing service pack it into boxes
/// and returns the loading plan for those boxes.
#[utoipa::path(
    post,
    path = "/plan",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Loading plan computed", body = PlanResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid order file", body = ErrorResponse),
        (status = BAD_GATEWAY, description = "Packing service failed", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn handle_plan(State(state): State<ApiState>, body: String) -> impl IntoResponse {
    let items = match orders::parse_order_matrix(body.as_bytes()) {
        Ok(items) => items,
        Err(err) => return order_file_error(err),
    };
    let customer_count = orders::customer_count(&items);
    log::info!(
        "📥 New order file: {} order items, {} customers",
        items.len(),
        customer_count
    );

    let boxes = if items.is_empty() {
        Vec::new()
    } else {
        match state.packing_client.pack(&items).await {
            Ok(boxes) => boxes,
            Err(err) => {
                log::error!("❌ Packing service failed: {err}");
                return packing_service_error(err);
            }
        }
    };

    let config = state.layout_settings.layout_config();
    let plan = plan_layout(boxes, &config);
    log::info!(
        "🚚 Result: {} stacks, {} warnings",
        plan.stack_count(),
        plan.warnings.len()
    );

    let response = PlanResponse {
        order_item_count: items.len(),
        customer_count,
        layout: LayoutResponse::from_plan(plan, config.bed),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for GET /box-types endpoint.
#[utoipa::path(
    get,
    path = "/box-types",
    responses((status = 200, description = "Configured box types", body = Vec<BoxType>)),
    tag = "layout"
)]
async fn handle_box_types() -> impl IntoResponse {
    Json(catalog::all().to_vec())
}

/// Serves the index.html main page
async fn serve_index() -> Response {
    match WebAssets::get("index.html") {
        Some(content) => Html(content.data).into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Serves static assets (JS, CSS, etc.)
async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
