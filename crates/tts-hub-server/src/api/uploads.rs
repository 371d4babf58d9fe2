//! Upload handlers for user and hailing clips.
//!
//! Both endpoints acknowledge every request; rejected uploads are only logged.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder, post, web};
use tts_hub_types::StatusAck;

use crate::state::AppState;
use crate::store::StoreCategory;
use crate::upload;

/// Multipart field carrying a user clip.
pub const OWN_FILE_FIELD: &str = "customTTS";
/// Multipart field carrying a hailing clip.
pub const HAILING_FIELD: &str = "customHailing";

#[utoipa::path(
    post,
    path = "/own-files/upload",
    request_body(content_type = "multipart/form-data", description = "Field `customTTS` with an .mp3 file"),
    responses(
        (status = 200, description = "Always acknowledged", body = StatusAck)
    )
)]
#[post("/own-files/upload")]
/// Store an uploaded clip as `OwnFile_<name>` in the permanent store.
pub async fn upload_own_file(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let target = state.upload_target(StoreCategory::Permanent, OWN_FILE_FIELD);
    upload::receive(payload, &state.spool_dir(), &target).await;
    HttpResponse::Ok().json(StatusAck::default())
}

#[utoipa::path(
    post,
    path = "/hailing-files/upload",
    request_body(content_type = "multipart/form-data", description = "Field `customHailing` with an .mp3 file"),
    responses(
        (status = 200, description = "Always acknowledged", body = StatusAck)
    )
)]
#[post("/hailing-files/upload")]
/// Store an uploaded clip as `Hailing_<name>` in the hailing store.
pub async fn upload_hailing_file(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let target = state.upload_target(StoreCategory::Hailing, HAILING_FIELD);
    upload::receive(payload, &state.spool_dir(), &target).await;
    HttpResponse::Ok().json(StatusAck::default())
}
