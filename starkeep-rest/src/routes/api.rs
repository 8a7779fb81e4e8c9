use actix_web::{
    web::{self, Data, Json, ServiceConfig},
    HttpResponse,
};
use serde::Deserialize;
use serde_json::json;
use starkeep::{
    analytics,
    settings::{Settings, DEFAULT_RETENTION_DAYS},
    Context,
};

use crate::AppResult;

pub async fn get_settings(ctx: Data<Context>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ctx.settings.get()))
}

#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    default_retention_days: Option<u32>,
}

pub async fn update_settings(
    ctx: Data<Context>,
    body: Json<SettingsUpdate>,
) -> AppResult<HttpResponse> {
    ctx.settings.set(&Settings {
        default_retention_days: body
            .default_retention_days
            .unwrap_or(DEFAULT_RETENTION_DAYS),
    })?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Global settings updated successfully" })))
}

/// Current usage report over the local backend.
pub async fn get_analytics(ctx: Data<Context>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(analytics::report(ctx.storage.local())))
}

/// Diagnostic for the remote blob backend: reports whether it is configured
/// and, when active, probes it with a list call.
pub async fn test_blob(ctx: Data<Context>) -> AppResult<HttpResponse> {
    let mut body = json!({
        "blob_token_set": ctx.storage.uses_blob(),
        "use_blob_storage": ctx.storage.uses_blob(),
        "storage_type": if ctx.storage.uses_blob() {
            "Remote blob storage"
        } else {
            "Local filesystem"
        },
    });

    if let Some(blob) = ctx.storage.blob() {
        match blob.probe().await {
            Ok(count) => {
                body["test_list_success"] = json!(true);
                body["test_blobs_found"] = json!(count);
            }
            Err(e) => {
                body["test_list_success"] = json!(false);
                body["test_error"] = json!(e.to_string());
            }
        }
    }

    Ok(HttpResponse::Ok().json(body))
}

pub fn config(cfg: &mut ServiceConfig) {
    cfg.service(
        web::resource("/settings")
            .route(web::get().to(get_settings))
            .route(web::post().to(update_settings)),
    )
    .service(web::resource("/analytics").route(web::get().to(get_analytics)))
    .service(web::resource("/test-blob").route(web::get().to(test_blob)));
}
