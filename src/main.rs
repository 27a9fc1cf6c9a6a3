use dotenvy::dotenv;
use quote_service::infrastructure::clock::SystemClock;
use quote_service::{build_server, AppConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    log::info!(
        "Starting server at http://{}:{} (page {}x{}pt, margin {}pt)",
        config.host,
        config.port,
        config.page.width(),
        config.page.height(),
        config.page.margin()
    );

    build_server(config.page, Box::new(SystemClock), &config.host, config.port)?.await
}
