use actix_web::{web, App, HttpServer};
use tenant_access::config::Config;
use tenant_access::middleware::{RequestTrace, StructuredLogger, TraceSpan};
use tenant_access::state::StateBuilder;
use tenant_access::{routes, telemetry};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = telemetry::init_tracing() {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let app_state = match StateBuilder::from_config(&config)
        .await
        .and_then(StateBuilder::build)
    {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };

    info!(host = %config.host, port = config.port, realm = %config.identity.realm, "starting tenant access backend");

    let data = web::Data::new(app_state.clone());

    HttpServer::new(move || {
        let state = app_state.clone();
        App::new()
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(move |cfg| routes::configure(cfg, &state))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
