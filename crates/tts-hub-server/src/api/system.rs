//! Host, discovery and speech handlers.
//!
//! Upstream failures keep the response shape stable: a sentinel string or a
//! placeholder entry instead of an error status.

use actix_web::{HttpResponse, Responder, get, post, web};
use tts_hub_types::{OwnerResponse, PlaybackGroup, SayRequest, SayResponse, VoiceEntry};

use crate::discovery::DISCOVERY_ERROR;
use crate::net::{NO_INTERFACE, external_ipv4};
use crate::speech;
use crate::state::AppState;
use crate::store::StoreCategory;
use crate::stream_server::stream_url;

#[utoipa::path(
    get,
    path = "/eth-address",
    responses(
        (status = 200, description = "First external IPv4 address, or NO ETH INTERFACE FOUND", body = String)
    )
)]
#[get("/eth-address")]
/// Report the address playback devices should use to reach this host.
pub async fn eth_address() -> impl Responder {
    match external_ipv4() {
        Some(ip) => HttpResponse::Ok().json(ip.to_string()),
        None => HttpResponse::Ok().json(NO_INTERFACE),
    }
}

#[utoipa::path(
    get,
    path = "/playback-groups",
    responses(
        (status = 200, description = "Discovered playback groups, or ERRORDISCOVERY", body = [PlaybackGroup])
    )
)]
#[get("/playback-groups")]
/// Discover playback groups on the local network.
pub async fn playback_groups(state: web::Data<AppState>) -> impl Responder {
    match state.discovery.list_targets().await {
        Ok(groups) => HttpResponse::Ok().json(groups),
        Err(e) => {
            tracing::warn!(error = %e, "error in discovery");
            HttpResponse::Ok().json(DISCOVERY_ERROR)
        }
    }
}

#[utoipa::path(
    get,
    path = "/voices",
    responses(
        (status = 200, description = "Voice catalog (placeholder entry on failure)", body = [VoiceEntry])
    )
)]
#[get("/voices")]
/// List voices offered by the speech service.
pub async fn voices(state: web::Data<AppState>) -> impl Responder {
    let voices: Vec<VoiceEntry> = speech::voices_or_placeholder(state.speech.as_ref()).await;
    HttpResponse::Ok().json(voices)
}

#[utoipa::path(
    get,
    path = "/owner",
    responses(
        (status = 200, description = "Client currently using the streaming server", body = OwnerResponse)
    )
)]
#[get("/owner")]
/// Report the advisory owner of the streaming server.
pub async fn owner(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(OwnerResponse {
        owner: state.active.owner(),
    })
}

#[utoipa::path(
    post,
    path = "/say",
    request_body = SayRequest,
    responses(
        (status = 200, description = "Clip ready for streaming", body = SayResponse),
        (status = 400, description = "Empty text"),
        (status = 502, description = "Speech service failed")
    )
)]
#[post("/say")]
/// Claim the streaming server and synthesize a phrase into the cache store.
pub async fn say(state: web::Data<AppState>, body: web::Json<SayRequest>) -> impl Responder {
    let request = body.into_inner();
    if request.text.trim().is_empty() {
        return HttpResponse::BadRequest().body("text is required");
    }
    state.active.set_owner(&request.client_id);

    let cache_dir = state.stores.dir(StoreCategory::Cache);
    match speech::synthesize_to_cache(
        state.speech.as_ref(),
        &cache_dir,
        &state.spool_dir(),
        &request.text,
        &request.voice_id,
    )
    .await
    {
        Ok((path, cached)) => {
            let stream_available = state.stream_listening();
            if !stream_available {
                tracing::warn!(
                    port = state.stream_port,
                    client = %request.client_id,
                    "streaming server is not listening; clip url is unreachable"
                );
            }
            HttpResponse::Ok().json(SayResponse {
                url: stream_url(&state.stream_host(), state.stream_port, &path),
                path: path.to_string_lossy().to_string(),
                cached,
                stream_available,
            })
        }
        Err(e) => {
            tracing::warn!(client = %request.client_id, error = %e, "synthesis failed");
            HttpResponse::BadGateway().body(format!("synthesis failed: {e:#}"))
        }
    }
}
