// Farm Equipment Sharing - REST API with Axum
//
// Every handler takes the registry lock for the whole call, so calls are
// applied one at a time in lock order.

use crate::contract::{ContractError, ContractValue, EquipmentContract};
use crate::equipment::{EquipmentRecord, NewEquipment, Principal};
use crate::error::RegistryError;
use crate::event::Event;
use crate::store::DynStore;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::error;

/// Header carrying the caller principal
pub const CALLER_HEADER: &str = "x-caller";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    contract: Arc<Mutex<EquipmentContract<DynStore>>>,
}

impl AppState {
    pub fn new(contract: EquipmentContract<DynStore>) -> Self {
        Self {
            contract: Arc::new(Mutex::new(contract)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EquipmentContract<DynStore>> {
        // A panicked handler never leaves a half-applied registration behind
        self.contract.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

fn respond<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(ApiResponse::ok(data))).into_response()
}

fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::error(message))).into_response()
}

fn registry_failure(err: RegistryError) -> Response {
    match err {
        RegistryError::InvalidInput(_) => fail(StatusCode::BAD_REQUEST, err.to_string()),
        RegistryError::IdSpaceExhausted => fail(StatusCode::CONFLICT, err.to_string()),
        RegistryError::Storage(e) => {
            error!(error = %e, "equipment store failure");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
        }
    }
}

fn caller_from(headers: &HeaderMap) -> Result<Principal, Response> {
    headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(Principal::new)
        .ok_or_else(|| {
            fail(
                StatusCode::BAD_REQUEST,
                format!("missing {} header", CALLER_HEADER),
            )
        })
}

/// Registration body; amounts arrive signed so negatives get a field error
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub category: String,
    pub daily_rate: i128,
    pub deposit: i128,
    pub location: String,
}

impl RegisterRequest {
    fn into_params(self) -> Result<NewEquipment, RegistryError> {
        NewEquipment::from_signed(
            self.name,
            self.category,
            self.daily_rate,
            self.deposit,
            self.location,
        )
    }
}

fn bad_body(rejection: JsonRejection) -> Response {
    fail(StatusCode::BAD_REQUEST, rejection.body_text())
}

#[derive(Serialize, Deserialize)]
pub struct RegisteredResponse {
    pub id: u64,
}

/// Contract call body: host literals plus call kind
#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub args: Vec<String>,
    #[serde(default)]
    pub read_only: bool,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/equipment - List all equipment in id order
async fn list_equipment(State(state): State<AppState>) -> Response {
    let contract = state.lock();

    match contract.registry().all_equipment() {
        Ok(records) => respond(StatusCode::OK, records),
        Err(e) => registry_failure(e),
    }
}

/// POST /api/equipment - Register equipment for the `x-caller` principal
async fn register_equipment(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let caller = match caller_from(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    let params = match payload.map_err(bad_body) {
        Ok(Json(request)) => match request.into_params() {
            Ok(params) => params,
            Err(e) => return registry_failure(e),
        },
        Err(response) => return response,
    };

    let mut contract = state.lock();

    match contract.registry_mut().register(params, &caller) {
        Ok(id) => respond(StatusCode::CREATED, RegisteredResponse { id }),
        Err(e) => registry_failure(e),
    }
}

/// GET /api/equipment/:id - Look up one record
async fn get_equipment(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let contract = state.lock();

    match contract.registry().get_equipment(id) {
        Ok(Some(record)) => respond::<EquipmentRecord>(StatusCode::OK, record),
        Ok(None) => fail(StatusCode::NOT_FOUND, format!("equipment {} not found", id)),
        Err(e) => registry_failure(e),
    }
}

/// GET /api/equipment/:id/events - Audit trail for one record
async fn equipment_events(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let contract = state.lock();

    match contract.registry().equipment_events(id) {
        Ok(events) => respond::<Vec<Event>>(StatusCode::OK, events),
        Err(e) => registry_failure(e),
    }
}

/// POST /api/contract/:method - Call the contract surface with host literals
async fn call_contract(
    State(state): State<AppState>,
    Path(method): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CallRequest>, JsonRejection>,
) -> Response {
    let caller = match caller_from(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => return bad_body(rejection),
    };

    let args = match ContractValue::parse_args(&request.args) {
        Ok(args) => args,
        Err(e) => return fail(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let result = if request.read_only {
        state.lock().call_read_only(&method, &args, &caller)
    } else {
        state.lock().call_public(&method, &args, &caller)
    };

    match result {
        Ok(value) => respond(StatusCode::OK, value),
        Err(ContractError::UnknownMethod(m)) => {
            fail(StatusCode::NOT_FOUND, format!("unknown method {}", m))
        }
        Err(ContractError::Registry(e)) => registry_failure(e),
        Err(e) => fail(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/equipment", get(list_equipment).post(register_equipment))
        .route("/equipment/:id", get(get_equipment))
        .route("/equipment/:id/events", get(equipment_events))
        .route("/contract/:method", post(call_contract))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
