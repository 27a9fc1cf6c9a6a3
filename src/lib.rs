pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;

use actix_web::{middleware::Logger, web, App, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::quote_service::QuoteService;
use domain::layout::{LayoutEngine, PageGeometry};
use domain::ports::Clock;

pub use config::AppConfig;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::quotes::summarize_quote, handlers::quotes::build_document),
    components(schemas(
        handlers::quotes::QuoteRequest,
        handlers::quotes::DocumentRequest,
        handlers::quotes::SummaryResponse,
        handlers::quotes::DocumentResponse,
    )),
    tags((name = "quotes", description = "Budget pricing and printable layout"))
)]
pub struct ApiDoc;

/// Register the quote routes. Expects a `SharedQuoteService` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/quotes")
            .route("/summary", web::post().to(handlers::quotes::summarize_quote))
            .route("/document", web::post().to(handlers::quotes::build_document)),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    page: PageGeometry,
    clock: Box<dyn Clock>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let service: web::Data<handlers::quotes::SharedQuoteService> =
        web::Data::new(QuoteService::new(clock, LayoutEngine::new(page)));

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
