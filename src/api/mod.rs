//! Read-only HTTP API over the three KV blobs.
//!
//! Handlers are stateless and only read from the store; each URL path maps
//! to one key with its own caching policy. The realtime path additionally
//! speaks conditional GET via a weak ETag derived from the feed timestamp.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use log::error;

use crate::store::{KvStore, REALTIME_STATUS_KEY, SCHEDULE_DATA_KEY, SCHEDULE_META_KEY};

const SCHEDULE_CACHE: &str = "public, max-age=3600";
const META_CACHE: &str = "public, max-age=60";
const REALTIME_CACHE: &str = "public, max-age=30";

pub struct ApiState {
    pub store: Arc<dyn KvStore>,
}

/// Binds and runs the server until shutdown.
pub async fn run_server(store: Arc<dyn KvStore>, bind_addr: &str) -> std::io::Result<()> {
    let state = web::Data::new(ApiState { store });
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}

/// Route table, shared with the handler tests.
///
/// Every resource answers bare `OPTIONS` itself and defaults all other
/// methods to 404, matching the contract that anything but a known GET is
/// a miss rather than a 405.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let options = || web::method(actix_web::http::Method::OPTIONS).to(preflight);
    cfg.service(
        web::resource("/api/schedule")
            .route(web::get().to(get_schedule))
            .route(options())
            .default_service(web::route().to(not_found)),
    )
    .service(
        web::resource("/api/meta")
            .route(web::get().to(get_meta))
            .route(options())
            .default_service(web::route().to(not_found)),
    )
    .service(
        web::resource("/api/realtime")
            .route(web::get().to(get_realtime))
            .route(options())
            .default_service(web::route().to(not_found)),
    )
    .service(
        web::resource("/api/{tail:.*}")
            .route(options())
            .default_service(web::route().to(not_found)),
    )
    .default_service(web::route().to(not_found));
}

async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .insert_header(("Content-Type", "text/plain"))
        .body("not found")
}

fn missing(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": message }))
}

fn store_failure(context: &str, err: crate::error::PipelineError) -> HttpResponse {
    error!("{context}: {err}");
    HttpResponse::InternalServerError().json(serde_json::json!({ "error": "store unavailable" }))
}

async fn get_schedule(state: web::Data<ApiState>) -> HttpResponse {
    match state.store.get(SCHEDULE_DATA_KEY).await {
        Ok(Some(body)) => HttpResponse::Ok()
            .insert_header(("Content-Type", "application/json"))
            .insert_header(("Cache-Control", SCHEDULE_CACHE))
            .body(body),
        Ok(None) => missing("No schedule data"),
        Err(err) => store_failure("schedule read", err),
    }
}

/// Serves the metadata blob, augmented with `realtimeAge`: seconds since
/// the last realtime feed timestamp, when one is stored.
async fn get_meta(state: web::Data<ApiState>) -> HttpResponse {
    let body = match state.store.get(SCHEDULE_META_KEY).await {
        Ok(Some(body)) => body,
        Ok(None) => return missing("No schedule metadata"),
        Err(err) => return store_failure("meta read", err),
    };

    let mut meta: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            error!("stored schedule metadata is not JSON: {err}");
            return missing("No schedule metadata");
        }
    };

    if let Ok(Some((_, realtime_meta))) = state.store.get_with_meta(REALTIME_STATUS_KEY).await {
        if let Some(feed_t) = realtime_meta.get("t").and_then(|t| t.parse::<i64>().ok()) {
            let age = (chrono::Utc::now().timestamp() - feed_t).max(0);
            if let Some(object) = meta.as_object_mut() {
                object.insert("realtimeAge".to_string(), serde_json::json!(age));
            }
        }
    }

    HttpResponse::Ok()
        .insert_header(("Cache-Control", META_CACHE))
        .json(meta)
}

async fn get_realtime(state: web::Data<ApiState>, req: HttpRequest) -> HttpResponse {
    let (body, metadata) = match state.store.get_with_meta(REALTIME_STATUS_KEY).await {
        Ok(Some(found)) => found,
        Ok(None) => return missing("No realtime data"),
        Err(err) => return store_failure("realtime read", err),
    };

    let etag = metadata.get("t").map(|t| format!("W/\"{t}\""));

    if let Some(etag) = &etag {
        let if_none_match = req
            .headers()
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok());
        if if_none_match == Some(etag.as_str()) {
            return HttpResponse::NotModified()
                .insert_header(("Cache-Control", REALTIME_CACHE))
                .insert_header(("ETag", etag.clone()))
                .finish();
        }
    }

    let mut response = HttpResponse::Ok();
    response
        .insert_header(("Content-Type", "application/json"))
        .insert_header(("Cache-Control", REALTIME_CACHE));
    if let Some(etag) = etag {
        response.insert_header(("ETag", etag));
    }
    response.body(body)
}
