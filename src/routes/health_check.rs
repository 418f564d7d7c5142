use actix_web::HttpResponse;

/// Liveness probe; does not touch Postgres or Redis
pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().finish()
}
