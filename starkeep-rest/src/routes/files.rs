use std::collections::BTreeMap;

use actix_multipart::Multipart;
use actix_web::{
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web::{Bytes, BytesMut, Data, Json, Path, Query},
    HttpRequest, HttpResponse,
};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use starkeep::{
    tree::{self, Node},
    Context,
};
use tracing::{info, warn};

use crate::{errors::AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct PingBody {
    client_id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Heartbeat: registers the client on first contact, refreshes its
/// last-seen data afterwards.
pub async fn ping(
    ctx: Data<Context>,
    req: HttpRequest,
    body: Json<PingBody>,
) -> AppResult<HttpResponse> {
    let client_id = body
        .client_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("client_id is required".into()))?;

    let kind = body.kind.as_deref().unwrap_or("unknown");
    let origin = req.peer_addr().map(|addr| addr.ip().to_string());
    let default_retention = ctx.settings.get().default_retention_days;

    ctx.clients
        .record_heartbeat(client_id, kind, origin, default_retention)?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Ping received successfully" })))
}

#[derive(Debug, Default)]
struct UploadForm {
    file: Option<Bytes>,
    client_id: Option<String>,
    relative_path: Option<String>,
}

impl UploadForm {
    async fn read(mut payload: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(mut field) = payload.try_next().await? {
            let name = field
                .content_disposition()
                .get_name()
                .unwrap_or_default()
                .to_owned();

            let mut data = BytesMut::new();
            while let Some(chunk) = field.try_next().await? {
                data.extend_from_slice(&chunk);
            }

            match name.as_str() {
                "file" => form.file = Some(data.freeze()),
                "client_id" => form.client_id = Some(String::from_utf8_lossy(&data).into_owned()),
                "relative_path" => {
                    form.relative_path = Some(String::from_utf8_lossy(&data).into_owned());
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Store an uploaded file at `<client_id>/<relative_path>`, overwriting any
/// existing object at that path.
pub async fn upload(ctx: Data<Context>, payload: Multipart) -> AppResult<HttpResponse> {
    let form = UploadForm::read(payload).await?;

    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest("No file part".into()))?;

    let (Some(client_id), Some(relative_path)) = (form.client_id, form.relative_path) else {
        return Err(AppError::BadRequest(
            "client_id and relative_path are required".into(),
        ));
    };

    if client_id.is_empty() || relative_path.is_empty() {
        return Err(AppError::BadRequest(
            "client_id and relative_path are required".into(),
        ));
    }

    let path = format!("{client_id}/{}", relative_path.replace('\\', "/"));
    let url = ctx.storage.put(&path, file).await?;

    info!("stored {path}");

    let mut body = json!({ "message": format!("File {relative_path} uploaded successfully") });
    if let Some(url) = url {
        body["url"] = json!(url);
    }

    Ok(HttpResponse::Created().json(body))
}

#[derive(Debug, Deserialize)]
pub struct CreateDirBody {
    client_id: Option<String>,
    relative_path: Option<String>,
}

/// Idempotently mirror a client-side directory.
pub async fn create_dir(ctx: Data<Context>, body: Json<CreateDirBody>) -> AppResult<HttpResponse> {
    let (Some(client_id), Some(relative_path)) = (&body.client_id, &body.relative_path) else {
        return Err(AppError::BadRequest(
            "client_id and relative_path are required".into(),
        ));
    };

    if client_id.is_empty() || relative_path.is_empty() {
        return Err(AppError::BadRequest(
            "client_id and relative_path are required".into(),
        ));
    }

    ctx.storage
        .create_dir(&format!("{client_id}/{relative_path}"))?;

    Ok(HttpResponse::Created()
        .json(json!({ "message": format!("Directory {relative_path} created successfully") })))
}

/// One client's slice of the listing.
#[derive(Debug, Serialize)]
pub struct ClientListing {
    label: String,
    files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tree: Option<BTreeMap<String, Node>>,
}

/// All stored files grouped by client. Clients known only from metadata
/// appear with an empty listing.
pub async fn list(ctx: Data<Context>) -> AppResult<HttpResponse> {
    let clients = ctx.clients.all();

    let mut out: BTreeMap<String, ClientListing> = clients
        .iter()
        .map(|(id, client)| {
            (
                id.clone(),
                ClientListing {
                    label: client.label.clone(),
                    files: Vec::new(),
                    tree: None,
                },
            )
        })
        .collect();

    // a failed backend enumeration degrades to an empty object set; the
    // metadata-known clients are still listed
    let paths = match ctx.storage.list("").await {
        Ok(paths) => paths,
        Err(e) => {
            warn!("listing storage failed, continuing with metadata only: {e}");
            Vec::new()
        }
    };

    let mut by_client: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for path in paths {
        let Some((client_id, rel)) = path.split_once('/') else {
            continue;
        };

        by_client
            .entry(client_id.to_owned())
            .or_default()
            .push(rel.to_owned());
    }

    for (client_id, rels) in by_client {
        let listing = out.entry(client_id.clone()).or_insert_with(|| ClientListing {
            // clients discovered only on disk fall back to their id
            label: client_id.clone(),
            files: Vec::new(),
            tree: None,
        });

        listing.tree = Some(tree::build(&client_id, rels.iter().map(String::as_str)));
    }

    Ok(HttpResponse::Ok().json(out))
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    view: Option<String>,
}

/// Download a stored object. `?view=true` serves PDFs inline instead of as
/// attachments; every other type is always an attachment.
pub async fn download(
    ctx: Data<Context>,
    path: Path<String>,
    query: Query<DownloadQuery>,
) -> AppResult<HttpResponse> {
    let path = path.into_inner();
    let data = ctx.storage.get(&path).await?;

    let filename = path.rsplit('/').next().unwrap_or(&path).to_owned();
    let is_pdf = filename.to_ascii_lowercase().ends_with(".pdf");
    let inline = is_pdf && query.view.as_deref() == Some("true");

    let disposition = ContentDisposition {
        disposition: if inline {
            DispositionType::Inline
        } else {
            DispositionType::Attachment
        },
        parameters: vec![DispositionParam::Filename(filename)],
    };

    let content_type = if is_pdf {
        mime::APPLICATION_PDF
    } else {
        mime::APPLICATION_OCTET_STREAM
    };

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(disposition)
        .body(data))
}

/// Delete a stored object from whichever backends hold it, pruning
/// now-empty parent folders.
pub async fn delete(ctx: Data<Context>, path: Path<String>) -> AppResult<HttpResponse> {
    let path = path.into_inner();

    if ctx.storage.delete(&path).await {
        Ok(HttpResponse::Ok().json(json!({ "message": format!("File {path} deleted successfully") })))
    } else {
        Err(AppError::NotFound)
    }
}
