use actix_web::{
    web::{self, Data, Json, Path, ServiceConfig},
    HttpResponse,
};
use serde::Deserialize;
use serde_json::json;
use starkeep::{clients::ClientPatch, Context};

use crate::{errors::AppError, AppResult};

/// All known clients and their metadata.
pub async fn clients(ctx: Data<Context>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ctx.clients.all()))
}

#[derive(Debug, Deserialize)]
pub struct LabelBody {
    label: Option<String>,
}

pub async fn set_label(
    ctx: Data<Context>,
    client_id: Path<String>,
    body: Json<LabelBody>,
) -> AppResult<HttpResponse> {
    let label = body
        .label
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("label is required".into()))?;

    if ctx.clients.set_label(&client_id, label)? {
        Ok(HttpResponse::Ok().json(json!({ "message": "Label updated successfully" })))
    } else {
        Err(AppError::NotFound)
    }
}

#[derive(Debug, Deserialize)]
pub struct SettingsBody {
    label: Option<String>,
    retention_days: Option<u32>,
}

pub async fn set_settings(
    ctx: Data<Context>,
    client_id: Path<String>,
    body: Json<SettingsBody>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();

    if body.label.is_none() && body.retention_days.is_none() {
        return Err(AppError::BadRequest(
            "label or retention_days is required".into(),
        ));
    }

    let patch = ClientPatch {
        label: body.label,
        retention_days: body.retention_days,
    };

    if ctx.clients.update(&client_id, &patch)? {
        Ok(HttpResponse::Ok().json(json!({ "message": "Client settings updated successfully" })))
    } else {
        Err(AppError::NotFound)
    }
}

pub fn config(cfg: &mut ServiceConfig) {
    cfg.service(web::resource("/clients").route(web::get().to(clients)))
        .service(web::resource("/clients/{client_id}/label").route(web::post().to(set_label)))
        .service(web::resource("/clients/{client_id}/settings").route(web::post().to(set_settings)));
}
