// src/web.rs
//! HTTP endpoint and live map page

use crate::{error::Result, publisher::Publisher};
use actix_web::{web, App, HttpResponse, HttpServer};
use log::info;

/// Map page; polls `/gps_data` once per second
const INDEX_HTML: &str = include_str!("../static/index.html");

/// Register the tracker routes on an app
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/gps_data", web::get().to(gps_data));
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

async fn gps_data(publisher: web::Data<Publisher>) -> HttpResponse {
    HttpResponse::Ok().json(publisher.current_fix_json())
}

/// Serve until the server stops. Fails only if the address cannot be bound.
pub async fn serve(publisher: Publisher, addr: &str) -> Result<()> {
    let data = web::Data::new(publisher);

    let server = HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind(addr)?
        .run();

    info!("Web server listening on http://{}", addr);
    server.await?;
    Ok(())
}
