//! Liveness probe and domain metrics.

use actix_web::{get, web, HttpResponse, Responder};
use sqlx::PgPool;

use crate::metrics;

#[get("/healthz")]
pub async fn healthz(db: web::Data<PgPool>) -> impl Responder {
    if sqlx::query("SELECT 1").execute(&**db).await.is_err() {
        return HttpResponse::ServiceUnavailable().body("db");
    }
    HttpResponse::Ok().body("ok")
}

/// GET /api/metrics/membership
#[get("/metrics/membership")]
pub async fn membership_metrics() -> impl Responder {
    match metrics::render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            log::error!("rendering metrics failed: {e:?}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz).service(membership_metrics);
}
