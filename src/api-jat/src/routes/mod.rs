use axum::{Json, Router, middleware, routing::get};
use core_jat::{CorsConfig, health_check};
use tower_http::trace::TraceLayer;

use data_model_jat::db::DbPool;
use data_model_jat::models::MessageResponse;

pub mod extract;
pub mod job_applications;
pub mod logging_middleware;
pub mod stats;

//
// Router
//

pub fn router(cors: &CorsConfig) -> Router<DbPool> {
    let job_application_routes = Router::new()
        .route(
            "/job-applications",
            get(job_applications::list_applications).post(job_applications::create_application),
        )
        .route("/job-applications/stats/summary", get(stats::get_summary))
        .route(
            "/job-applications/{id}",
            get(job_applications::get_application)
                .put(job_applications::update_application)
                .delete(job_applications::delete_application),
        );

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", job_application_routes)
        // Custom route access logging
        .layer(middleware::from_fn(logging_middleware::log_route_access))
        // Tracing middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors.layer())
}

// GET / - Service banner
async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Job Application Tracker API is running!".to_string(),
    })
}
