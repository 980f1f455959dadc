//! HTTP API for the ITEMLEDGER node

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use itemledger_core::{LedgerError, LedgerResult};
use itemledger_items::Invocation;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::runtime::{payload_to_json, LedgerRuntime};

/// API state containing node runtime
pub type ApiState = Arc<LedgerRuntime>;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Raw invocation request
#[derive(Deserialize)]
pub struct InvokeRequest {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Create item request
#[derive(Deserialize)]
pub struct CreateItemRequest {
    pub id: String,
    pub name: String,
    pub price: i64,
}

/// Update item request
#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub name: String,
    pub price: i64,
}

/// Node status response
#[derive(Serialize)]
pub struct NodeStatusResponse {
    pub name: String,
    pub state_version: u64,
    pub record_count: usize,
    pub committed_transactions: u64,
    pub storage: String,
}

type ApiReply = (StatusCode, Json<ApiResponse<serde_json::Value>>);

/// Create API router
pub fn create_router(state: ApiState) -> Router {
    let router = Router::new()
        // Health
        .route("/health", get(health))
        .route("/status", get(status))
        // Contract
        .route("/invoke", post(invoke))
        .route("/init", post(init_ledger))
        // Items
        .route("/items", get(get_all_items).post(create_item))
        .route(
            "/items/:id",
            get(read_item).put(update_item).delete(delete_item),
        )
        .route("/items/:id/exists", get(item_exists));

    let cors_enabled = state.config().api.enable_cors;
    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    if cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

/// Health check
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Node status
async fn status(State(runtime): State<ApiState>) -> impl IntoResponse {
    match runtime.record_count() {
        Ok(record_count) => {
            let status = NodeStatusResponse {
                name: runtime.config().name.clone(),
                state_version: runtime.state_version().0,
                record_count,
                committed_transactions: runtime.committed_transactions(),
                storage: format!("{:?}", runtime.config().storage).to_lowercase(),
            };
            (StatusCode::OK, Json(ApiResponse::ok(status)))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<NodeStatusResponse>::err(e)),
        ),
    }
}

/// Raw named-function invocation
async fn invoke(State(runtime): State<ApiState>, Json(req): Json<InvokeRequest>) -> ApiReply {
    match Invocation::parse(&req.function, &req.args) {
        Ok(invocation) => respond(execute(runtime, invocation).await, StatusCode::OK),
        Err(e) => reply_err(e),
    }
}

async fn init_ledger(State(runtime): State<ApiState>) -> ApiReply {
    respond(execute(runtime, Invocation::InitLedger).await, StatusCode::OK)
}

async fn get_all_items(State(runtime): State<ApiState>) -> ApiReply {
    respond(execute(runtime, Invocation::GetAllItems).await, StatusCode::OK)
}

async fn create_item(
    State(runtime): State<ApiState>,
    Json(req): Json<CreateItemRequest>,
) -> ApiReply {
    let invocation = Invocation::CreateItem {
        id: req.id,
        name: req.name,
        price: req.price,
    };
    respond(execute(runtime, invocation).await, StatusCode::CREATED)
}

async fn read_item(State(runtime): State<ApiState>, Path(id): Path<String>) -> ApiReply {
    respond(execute(runtime, Invocation::ReadItem { id }).await, StatusCode::OK)
}

async fn update_item(
    State(runtime): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> ApiReply {
    let invocation = Invocation::UpdateItem {
        id,
        name: req.name,
        price: req.price,
    };
    respond(execute(runtime, invocation).await, StatusCode::OK)
}

async fn delete_item(State(runtime): State<ApiState>, Path(id): Path<String>) -> ApiReply {
    respond(execute(runtime, Invocation::DeleteItem { id }).await, StatusCode::OK)
}

async fn item_exists(State(runtime): State<ApiState>, Path(id): Path<String>) -> ApiReply {
    respond(execute(runtime, Invocation::ItemExists { id }).await, StatusCode::OK)
}

/// Run an invocation off the async executor; sled commits flush to disk
async fn execute(runtime: ApiState, invocation: Invocation) -> LedgerResult<Vec<u8>> {
    tokio::task::spawn_blocking(move || runtime.execute(&invocation))
        .await
        .map_err(|e| LedgerError::Internal(e.to_string()))?
}

fn respond(result: LedgerResult<Vec<u8>>, success: StatusCode) -> ApiReply {
    match result.and_then(|payload| payload_to_json(&payload)) {
        Ok(data) => (success, Json(ApiResponse::ok(data))),
        Err(e) => reply_err(e),
    }
}

fn reply_err(e: LedgerError) -> ApiReply {
    let status = status_for(&e);
    if status.is_server_error() {
        error!("Request failed: {}", e);
    }
    (status, Json(ApiResponse::err(e)))
}

/// HTTP status for a contract error
pub fn status_for(e: &LedgerError) -> StatusCode {
    match e {
        LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
        LedgerError::InvalidArgument(_) | LedgerError::UnknownFunction(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Start API server
pub async fn start_api_server(runtime: Arc<LedgerRuntime>, listen_addr: &str) -> anyhow::Result<()> {
    let router = create_router(runtime);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("API server listening on {}", listen_addr);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use itemledger_core::NodeConfig;
    use itemledger_items::SeedConfig;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let runtime = LedgerRuntime::open(NodeConfig::default(), SeedConfig::default()).unwrap();
        runtime.initialize().unwrap();
        create_router(Arc::new(runtime))
    }

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let router = test_router();
        let (status, body) = call(&router, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_item_lifecycle() {
        let router = test_router();

        let (status, _) = call(
            &router,
            "POST",
            "/items",
            Some(serde_json::json!({"id": "item4", "name": "Item 4", "price": 400})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(&router, "GET", "/items/item4", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            serde_json::json!({"id": "item4", "name": "Item 4", "price": 400})
        );

        let (status, _) = call(
            &router,
            "PUT",
            "/items/item4",
            Some(serde_json::json!({"name": "Item 4b", "price": 450})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&router, "GET", "/items", None).await;
        let ids: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["item1", "item2", "item3", "item4"]);

        let (status, _) = call(&router, "DELETE", "/items/item2", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&router, "GET", "/items/item2/exists", None).await;
        assert_eq!(body["data"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn test_missing_item_is_404() {
        let router = test_router();

        let (status, body) = call(&router, "GET", "/items/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "ReadItem: the item nope does not exist");

        let (status, _) = call(&router, "DELETE", "/items/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invoke_endpoint() {
        let router = test_router();

        let (status, body) = call(
            &router,
            "POST",
            "/invoke",
            Some(serde_json::json!({"function": "ReadItem", "args": ["item1"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["price"], 100);

        let (status, _) = call(
            &router,
            "POST",
            "/invoke",
            Some(serde_json::json!({"function": "CreateItem", "args": ["x", "X", "cheap"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &router,
            "POST",
            "/invoke",
            Some(serde_json::json!({"function": "BurnItem"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status() {
        let router = test_router();
        let (status, body) = call(&router, "GET", "/status", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["record_count"], 3);
        assert_eq!(body["data"]["state_version"], 1);
        assert_eq!(body["data"]["storage"], "memory");
    }
}
