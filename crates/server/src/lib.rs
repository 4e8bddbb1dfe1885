use std::sync::Arc;

use axum::Router;
use db::DBService;
use services::services::{
    challenge::ChallengeService,
    gamification::GamificationService,
    saga_path::{SagaPathService, SqlitePathStore},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod routes;

/// Shared handler state. Services are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub challenges: ChallengeService,
    pub gamification: GamificationService,
    pub saga_path: SagaPathService,
}

impl AppState {
    pub fn new(db: DBService, streak_freeze_cost: i64) -> Self {
        let gamification = GamificationService::new(db.pool.clone(), streak_freeze_cost);
        let saga_path = SagaPathService::new(
            Arc::new(SqlitePathStore::new(db.pool.clone())),
            Arc::new(gamification.clone()),
        );
        Self {
            challenges: ChallengeService::new(db.pool.clone()),
            gamification,
            saga_path,
            db,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::challenges::router())
        .merge(routes::saga_path::router())
        .merge(routes::wallet::router());

    Router::new()
        .merge(routes::health::router())
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
