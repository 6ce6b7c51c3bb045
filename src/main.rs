/// VideoFlow backend - HTTP server and transcode workers
use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;

use videoflow::app_state::AppState;
use videoflow::routes;
use videoflow::security::jwt::JwtKeys;
use videoflow::services::stale_jobs::spawn_stale_job_sweeper;
use videoflow::services::storage::{ObjectStorage, S3Storage};
use videoflow::services::transcoder::FfmpegEncoder;
use videoflow::services::video_jobs::{create_job_queue, spawn_workers, TranscodeContext};
use videoflow::Config;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Invalid configuration: {e}")))?;

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Database connect: {e}")))?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Migrations: {e}")))?;

    let storage: Arc<dyn ObjectStorage> = Arc::new(
        S3Storage::new(&config.s3)
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Storage init: {e}")))?,
    );
    // Processing depends entirely on the object store; refuse to start
    // without it.
    storage
        .ensure_bucket()
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Storage bootstrap: {e}")))?;

    let jwt_keys = Arc::new(JwtKeys::from_secret(&config.auth.jwt_secret));

    let (job_sender, job_receiver) = create_job_queue(config.transcoding.queue_capacity);
    let transcode_ctx = Arc::new(TranscodeContext {
        pool: db_pool.clone(),
        storage: storage.clone(),
        encoder: Arc::new(FfmpegEncoder::new(&config.transcoding)),
        renditions: config.transcoding.renditions.clone(),
    });
    let _workers = spawn_workers(
        transcode_ctx,
        job_receiver,
        config.transcoding.worker_count,
    );
    let _sweeper = spawn_stale_job_sweeper(
        db_pool.clone(),
        config.transcoding.stale_after_seconds,
        config.transcoding.sweep_interval_seconds,
    );

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("VideoFlow backend listening on {}", bind_address);

    let state = AppState {
        config: config.clone(),
        pool: db_pool,
        storage,
        jobs: job_sender,
        jwt_keys: jwt_keys.clone(),
    };

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(actix_middleware::Logger::default())
            .wrap(Cors::permissive())
            .service(routes::api_routes(jwt_keys.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
