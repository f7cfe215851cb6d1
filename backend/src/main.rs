use std::{net::SocketAddr, sync::Arc};

use backend::{
    create_router,
    current::RouteSlot,
    enrich::{ForecastClient, ImageClient},
    ors::{self, OrsClient},
    persist::RouteArchive,
    search::{SearchConfig, TripPlanner},
    store::PgRouteStore,
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_key = std::env::var("ORS_API_KEY").expect("ORS_API_KEY must be set");
    let ors_base_url =
        std::env::var("ORS_BASE_URL").unwrap_or_else(|_| ors::DEFAULT_BASE_URL.to_string());
    let provider =
        OrsClient::with_base_url(&api_key, &ors_base_url).expect("construct directions client");

    let store = PgRouteStore::connect().await.expect("connect to route store");
    store.migrate().await.expect("run route store migrations");

    let state = AppState {
        planner: Arc::new(TripPlanner::new(provider, SearchConfig::default())),
        archive: Arc::new(RouteArchive::new(store)),
        slot: Arc::new(RouteSlot::new()),
        forecast: Arc::new(ForecastClient::new()),
        images: Arc::new(ImageClient::new()),
    };
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:5000".to_string())
        .parse()
        .expect("valid socket address");
    tracing::info!("starting backend on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}
