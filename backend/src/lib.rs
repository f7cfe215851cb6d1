pub mod codec;
pub mod current;
pub mod enrich;
pub mod geo;
pub mod ors;
pub mod persist;
pub mod retry;
pub mod search;
pub mod split;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    routing::{delete, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use shared::{ApiError, SaveTripRequest, SavedTrip, TripRequest, TripResponse};

use crate::current::RouteSlot;
use crate::enrich::{ForecastClient, ImageClient};
use crate::geo::path_distance_km;
use crate::ors::OrsClient;
use crate::persist::RouteArchive;
use crate::search::{PlannedTrip, SearchError, TripPlanner};
use crate::store::{PgRouteStore, StoreError, StoredRoute};

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<TripPlanner<OrsClient>>,
    pub archive: Arc<RouteArchive<PgRouteStore>>,
    pub slot: Arc<RouteSlot>,
    pub forecast: Arc<ForecastClient>,
    pub images: Arc<ImageClient>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate-route", post(generate_route))
        .route("/api/routes", post(save_route).get(list_routes))
        .route("/api/routes/:id", delete(delete_route))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Caller identity, verified by the auth layer in front of this service and
/// forwarded as a plain header.
pub struct Owner(pub String);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|value| Owner(value.to_owned()))
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ApiError {
                        message: "missing user identity".to_string(),
                    }),
                )
            })
    }
}

async fn generate_route(
    State(state): State<AppState>,
    _owner: Owner,
    Json(req): Json<TripRequest>,
) -> Result<Json<TripResponse>, (StatusCode, Json<ApiError>)> {
    let token = state.slot.begin();

    let trip = state
        .planner
        .plan(&req.destination, req.trip_type)
        .await
        .map_err(search_error_response)?;

    let forecast = match trip.path.first() {
        Some(start) => state.forecast.daily_forecast(*start).await,
        None => Vec::new(),
    };
    let image_url = state.images.destination_image(&trip.destination).await;

    if !state.slot.publish(token, trip.clone()) {
        tracing::debug!(
            destination = %trip.destination,
            "stale search result not stored as current route"
        );
    }

    Ok(Json(TripResponse {
        destination: trip.destination,
        trip_type: trip.trip_type,
        path: trip.path,
        path_days: trip.path_days,
        distance_km: trip.distance_km,
        forecast,
        image_url,
    }))
}

async fn save_route(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(req): Json<SaveTripRequest>,
) -> Result<(StatusCode, Json<StoredRoute>), (StatusCode, Json<ApiError>)> {
    let trip = PlannedTrip {
        destination: req.destination,
        trip_type: req.trip_type,
        distance_km: path_distance_km(&req.path),
        path_days: if req.path_days.is_empty() {
            vec![req.path.clone()]
        } else {
            req.path_days
        },
        path: req.path,
    };

    state
        .archive
        .save_route(&owner, &trip, &req.name, req.description)
        .await
        .map(|stored| (StatusCode::CREATED, Json(stored)))
        .map_err(store_error_response)
}

async fn list_routes(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<Vec<SavedTrip>>, (StatusCode, Json<ApiError>)> {
    state
        .archive
        .load_routes(&owner)
        .await
        .map(Json)
        .map_err(store_error_response)
}

async fn delete_route(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<i32>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    state
        .archive
        .delete_route(id, &owner)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(store_error_response)
}

fn search_error_response(err: SearchError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        SearchError::DestinationNotFound(_)
        | SearchError::NoLoopFound(_)
        | SearchError::NoTourFound(_) => StatusCode::NOT_FOUND,
        SearchError::Geocode(_) => StatusCode::BAD_GATEWAY,
        SearchError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
    };

    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}

fn store_error_response(err: StoreError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        StoreError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        StoreError::InvalidData(_) => StatusCode::BAD_REQUEST,
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
