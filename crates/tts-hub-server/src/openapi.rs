use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::files::list_own_files,
        api::files::list_hailing_files,
        api::files::list_cache_files,
        api::files::delete_own_file,
        api::files::delete_hailing_file,
        api::uploads::upload_own_file,
        api::uploads::upload_hailing_file,
        api::system::eth_address,
        api::system::playback_groups,
        api::system::voices,
        api::system::owner,
        api::system::say,
        api::health::health,
    ),
    components(
        schemas(
            tts_hub_types::StoredFileEntry,
            tts_hub_types::StatusAck,
            tts_hub_types::VoiceEntry,
            tts_hub_types::PlaybackGroup,
            tts_hub_types::SayRequest,
            tts_hub_types::SayResponse,
            tts_hub_types::OwnerResponse,
            tts_hub_types::HealthResponse,
        )
    ),
    tags(
        (name = "tts-hub-server", description = "TTS clip store control API")
    )
)]
pub struct ApiDoc;
