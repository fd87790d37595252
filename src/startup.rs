pub use crate::configuration;
use crate::configuration::get_configuration;
use crate::predictor::ModelRegistry;
use crate::routes::advisor::{
    fertilizer_recommend_handler, legacy_fertilizer_handler, legacy_stress_handler,
    spray_recommend_handler, stress_predict_handler,
};
use crate::routes::auth::{current_user_handler, login_handler, register_handler};
use crate::routes::location::{location_data_handler, weather_handler};
use crate::routes::predict::{
    crop_recommend_handler, legacy_yield_handler, location_predict_handler,
    manual_predict_handler, recommend_crop_handler, yield_predict_handler,
};
use crate::routes::stats::{database_stats_handler, prediction_history_handler};
use crate::services::auth::AuthService;
use crate::services::prediction::PredictionService;
use crate::services::resolver::LocationService;
use crate::store::{PredictionRepository, UserRepository, WeatherLogRepository};
use crate::weather::WeatherClient;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    routing::{get, post},
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth_service: AuthService,
    pub location_service: LocationService,
    pub prediction_service: PredictionService,
}

pub fn build_router(state: AppState) -> Router {
    // Same browser origins the original frontend dev servers use.
    let allowed_origins = [
        "http://localhost:3000",
        "http://localhost:3001",
        "http://localhost:3002",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:3001",
        "http://127.0.0.1:3002",
    ]
    .map(|origin| origin.parse::<HeaderValue>().expect("static origin"));

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/users/me", get(current_user_handler))
        .route("/predict/manual", post(manual_predict_handler))
        .route("/predict/location", post(location_predict_handler))
        .route("/recommend_crop", get(recommend_crop_handler))
        .route("/predict_yield", get(legacy_yield_handler))
        .route("/recommend_fertilizer", get(legacy_fertilizer_handler))
        .route("/predict_stress", get(legacy_stress_handler))
        .route("/api/location-data", get(location_data_handler))
        .route("/api/weather", get(weather_handler))
        .route("/api/crop/recommend", post(crop_recommend_handler))
        .route("/api/yield/predict", post(yield_predict_handler))
        .route("/api/fertilizer/recommend", post(fertilizer_recommend_handler))
        .route("/api/stress/predict", post(stress_predict_handler))
        .route("/api/spray/recommend", post(spray_recommend_handler))
        .route("/api/predictions", get(prediction_history_handler))
        .route("/api/database/stats", get(database_stats_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run() {
    let cfg = get_configuration().expect("could not get config");

    let pg_pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(cfg.database.with_db());

    let registry = Arc::new(
        ModelRegistry::load(Path::new(&cfg.models.dir)).expect("could not load model artifacts"),
    );

    let weather = WeatherClient::new(
        cfg.weather.base_url.clone(),
        Duration::from_secs(cfg.weather.timeout_secs),
    );

    let auth_service = AuthService::new(UserRepository::new(pg_pool.clone()));
    let location_service =
        LocationService::new(weather, WeatherLogRepository::new(pg_pool.clone()));
    let prediction_service =
        PredictionService::new(registry, PredictionRepository::new(pg_pool.clone()));

    let app_state = AppState {
        auth_service,
        location_service,
        prediction_service,
    };
    let app = build_router(app_state);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", cfg.application.host, cfg.application.port))
            .await
            .expect("could not bind listener");
    tracing::info!("Listening on {}:{}", cfg.application.host, cfg.application.port);
    axum::serve(listener, app)
        .await
        .expect("could not start server");
}
