use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::auth::api_key::ApplicationCaller;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct WhoAmI {
    application_id: String,
}

async fn whoami(application: ApplicationCaller) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(WhoAmI {
        application_id: application.application_id,
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/whoami", web::get().to(whoami));
}
