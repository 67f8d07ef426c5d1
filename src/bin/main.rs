use actix_web::{middleware::Logger, web, App, HttpServer};
use league_server::{config::settings, http, metrics};
use sqlx::postgres::PgPoolOptions;
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    // Configuration
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());

    // Postgres pool
    let db_pool = PgPoolOptions::new()
        .max_connections(settings().db_max_connections)
        .connect(&database_url)
        .await
        .expect("Failed to create Postgres pool");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run migrations");

    log::info!("membership policy: {:?}", settings().policy());

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(metrics::METRICS.clone())
            .app_data(web::Data::new(db_pool.clone()))
            .configure(http::routes::init_routes)
    })
    .bind(&server_addr)?
    .run()
    .await
}
