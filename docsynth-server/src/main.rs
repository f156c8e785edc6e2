#![deny(missing_docs)]
//! Docsynth server executable.
//!
//! Hosts HTTP endpoints for docstring synthesis and PEP 257 validation.

mod openapi;
mod routes;

#[cfg(not(test))]
use actix_cors::Cors;
#[cfg(not(test))]
use actix_web::{App, HttpServer, http::header, web};
#[cfg(not(test))]
use dotenvy::dotenv;

#[cfg(not(test))]
use crate::routes::{
    AppState, ServerConfig, analyze, analyze_batch, json_config, openapi_json, styles,
};

#[cfg(not(test))]
fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env();
    log::info!(
        "default style {}, issue limit {}, max source {} bytes",
        config.default_style,
        config.issue_limit,
        config.max_source_bytes
    );
    let json = json_config(&config);
    let state = web::Data::new(AppState::new(config));

    let origins = std::env::var("DOCSYNTH_UI_ORIGINS")
        .unwrap_or_else(|_| "http://127.0.0.1:4200,http://localhost:4200".to_string());
    let allowed_origins: Vec<String> = origins
        .split(',')
        .map(|value| value.trim())
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect();

    let listen_addr = std::env::var("DOCSYNTH_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let raw_port = std::env::var("DOCSYNTH_PORT").unwrap_or_else(|_| "8080".to_string());
    let listen_port: u16 = raw_port.trim().parse().map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("DOCSYNTH_PORT must be a u16 number, got {raw_port}"),
        )
    })?;

    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            let mut cors = Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::CONTENT_TYPE])
                .max_age(3600);
            for origin in &allowed_origins {
                cors = cors.allowed_origin(origin);
            }
            App::new()
                .wrap(actix_web::middleware::Logger::default())
                .wrap(cors)
                .app_data(state.clone())
                .app_data(json.clone())
                .service(analyze)
                .service(analyze_batch)
                .service(styles)
                .service(openapi_json)
        })
        .bind((listen_addr, listen_port))?
        .run()
        .await
    })
}

#[cfg(test)]
fn main() {}
