//! patchdoh server
//!
//! A DNS-over-HTTPS forwarding proxy that rewrites CDN-fronted answers to
//! point at a donor hostname. This binary wires logging, configuration, and
//! the actix-web HTTP server entry point.

use patchdoh::config::settings::{apply_env_overrides, load_settings};
use patchdoh::config::validation::ConfigValidator;
use patchdoh::logs::logger::configure_logger;
use patchdoh::routes::{dns, health};
use patchdoh::services::handler::AppState;

use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};
use tokio::signal;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    configure_logger();

    let settings = load_settings().expect("failed to load settings");
    let settings = apply_env_overrides(settings);

    info!("Starting patchdoh v{}", settings.version);

    let validation_result = ConfigValidator::validate_comprehensive(&settings);
    if !validation_result.is_valid {
        error!("Configuration validation failed:");
        for error in &validation_result.errors {
            error!("  - {}", error);
        }
        std::process::exit(1);
    }
    for warning in &validation_result.warnings {
        log::warn!("{}", warning);
    }
    info!(
        "Configuration validated successfully with {} warnings",
        validation_result.warnings.len()
    );

    let host = settings.bind_host.clone();
    let port = settings.bind_port;
    let app_state = web::Data::new(AppState::from_settings(&settings));

    info!("Starting server on {}:{}", host, port);
    info!("Default upstream resolver: {}", settings.default_upstream);
    info!("Donor domain: {}", settings.donor_domain);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::new(r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#))
            .wrap(actix_web::middleware::Compress::default())
            .configure(health::configure_health)
            .configure(dns::configure_dns)
    })
    .bind((host.as_str(), port))?
    .run();

    info!("Server started successfully");

    tokio::select! {
        result = server => {
            match result {
                Ok(_) => info!("Server stopped gracefully"),
                Err(e) => error!("Server error: {}", e),
            }
        }
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal, stopping server...");
        }
    }

    Ok(())
}
