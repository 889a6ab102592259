use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use log::{info, warn};

use survey_server::{
    app_state::AppState, config::Config, handlers, middleware::RequestIdMiddleware,
};

fn build_cors(config: &Config) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    match &config.cors_allowed_origin {
        Some(origin) => cors.allowed_origin(origin),
        None => cors.allow_any_origin(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();

    if config.is_production() {
        config.validate_for_production();
    } else if config.azure_tenant_id.is_none() {
        warn!("AZURE_TENANT_ID is not set; every admin request will be rejected");
    }

    let host = config.web_server_host.clone();
    let port = config.web_server_port;

    let app_state = AppState::new(config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    info!(
        "Starting survey server on {}:{} ({})",
        host, port, app_state.config.environment
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(RequestIdMiddleware)
            .wrap(build_cors(&app_state.config))
            .wrap(Logger::new(
                "%a \"%r\" %s %b %T request_id=%{x-request-id}o",
            ))
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
