//! Stored file listing and deletion handlers.

use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;
use tts_hub_types::{StatusAck, StoredFileEntry};
use utoipa::IntoParams;

use crate::registry::{self, DELETE_ALL_SENTINEL};
use crate::state::AppState;
use crate::store::{AUDIO_EXTENSION, StoreCategory};

/// Query parameters for delete requests.
#[derive(Deserialize, IntoParams)]
pub struct DeleteQuery {
    /// Stored file name, or `DELETEallFiles` where bulk delete is supported.
    #[serde(rename = "FileName")]
    pub file_name: Option<String>,
}

async fn list_category(state: &AppState, category: StoreCategory) -> Vec<StoredFileEntry> {
    let suffix = format!(".{AUDIO_EXTENSION}");
    registry::list(&state.stores.dir(category), category, &suffix)
        .await
        .into_iter()
        .map(StoredFileEntry::from)
        .collect()
}

#[utoipa::path(
    get,
    path = "/own-files",
    responses(
        (status = 200, description = "User uploaded clips", body = [StoredFileEntry])
    )
)]
#[get("/own-files")]
/// List clips in the permanent store.
pub async fn list_own_files(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(list_category(&state, StoreCategory::Permanent).await)
}

#[utoipa::path(
    get,
    path = "/hailing-files",
    responses(
        (status = 200, description = "Hailing alert clips", body = [StoredFileEntry])
    )
)]
#[get("/hailing-files")]
/// List clips in the hailing store.
pub async fn list_hailing_files(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(list_category(&state, StoreCategory::Hailing).await)
}

#[utoipa::path(
    get,
    path = "/cache-files",
    responses(
        (status = 200, description = "Synthesized clips in the cache", body = [StoredFileEntry])
    )
)]
#[get("/cache-files")]
/// List clips in the cache store.
pub async fn list_cache_files(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(list_category(&state, StoreCategory::Cache).await)
}

#[utoipa::path(
    get,
    path = "/hailing-files/delete",
    params(DeleteQuery),
    responses(
        (status = 200, description = "Always acknowledged", body = StatusAck)
    )
)]
#[get("/hailing-files/delete")]
/// Delete one hailing clip.
pub async fn delete_hailing_file(
    state: web::Data<AppState>,
    query: web::Query<DeleteQuery>,
) -> impl Responder {
    match query.file_name.as_deref() {
        Some(name) => registry::delete_one(&state.stores.dir(StoreCategory::Hailing), name).await,
        None => tracing::warn!("hailing delete without FileName"),
    }
    HttpResponse::Ok().json(StatusAck::default())
}

#[utoipa::path(
    get,
    path = "/own-files/delete",
    params(DeleteQuery),
    responses(
        (status = 200, description = "Always acknowledged", body = StatusAck)
    )
)]
#[get("/own-files/delete")]
/// Delete one user clip, or every user clip with `DELETEallFiles`.
pub async fn delete_own_file(
    state: web::Data<AppState>,
    query: web::Query<DeleteQuery>,
) -> impl Responder {
    let dir = state.stores.dir(StoreCategory::Permanent);
    match query.file_name.as_deref() {
        Some(DELETE_ALL_SENTINEL) => {
            let removed = registry::delete_all(&dir, StoreCategory::Permanent).await;
            tracing::info!(count = removed, "deleted all user clips");
        }
        Some(name) => registry::delete_one(&dir, name).await,
        None => tracing::warn!("own file delete without FileName"),
    }
    HttpResponse::Ok().json(StatusAck::default())
}
