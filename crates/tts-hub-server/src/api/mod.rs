//! Control-plane HTTP handlers.
//!
//! Consumed by the admin UI: file listings, deletes, uploads, and lookups of
//! host address, playback groups and voices.

pub mod files;
pub mod health;
pub mod system;
pub mod uploads;

use actix_web::web;

pub use files::{
    delete_hailing_file,
    delete_own_file,
    list_cache_files,
    list_hailing_files,
    list_own_files,
};
pub use system::{eth_address, owner, playback_groups, say, voices};
pub use uploads::{upload_hailing_file, upload_own_file};

/// Register every control-plane route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(list_own_files)
        .service(list_hailing_files)
        .service(list_cache_files)
        .service(delete_own_file)
        .service(delete_hailing_file)
        .service(upload_own_file)
        .service(upload_hailing_file)
        .service(eth_address)
        .service(playback_groups)
        .service(voices)
        .service(owner)
        .service(say);
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use actix_web::http::header;
    use actix_web::{App, test, web};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use tts_hub_types::{
        OwnerResponse, PlaybackGroup, SayRequest, SayResponse, StatusAck, StoredFileEntry,
        VoiceEntry,
    };

    use crate::discovery::PlaybackDiscovery;
    use crate::speech::UnconfiguredSpeech;
    use crate::speech::fake::FakeSpeech;
    use crate::state::AppState;
    use crate::store::{StoreCategory, StoreLayout};
    use crate::test_support::temp_root;

    struct FailingDiscovery;

    #[async_trait]
    impl PlaybackDiscovery for FailingDiscovery {
        async fn list_targets(&self) -> Result<Vec<PlaybackGroup>> {
            Err(anyhow!("no multicast route"))
        }
    }

    struct StaticDiscovery;

    #[async_trait]
    impl PlaybackDiscovery for StaticDiscovery {
        async fn list_targets(&self) -> Result<Vec<PlaybackGroup>> {
            Ok(vec![PlaybackGroup {
                name: "Kitchen".to_string(),
                host: "192.168.1.40".to_string(),
            }])
        }
    }

    fn make_state(tag: &str) -> web::Data<AppState> {
        let stores = StoreLayout::new(temp_root(tag));
        for category in StoreCategory::ALL {
            std::fs::create_dir_all(stores.dir(category)).unwrap();
        }
        let state = web::Data::new(AppState::new(
            stores,
            Arc::new(FakeSpeech::default()),
            Arc::new(StaticDiscovery),
            Some("192.168.1.20".parse().unwrap()),
            1980,
        ));
        state.set_stream_listening(true);
        state
    }

    fn multipart(field: &str, filename: &str, content: &[u8]) -> (String, Vec<u8>) {
        let boundary = "tts-hub-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: audio/mpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={boundary}"), body)
    }

    fn upload_request(uri: &str, field: &str, filename: &str, content: &[u8]) -> test::TestRequest {
        let (content_type, body) = multipart(field, filename, content);
        test::TestRequest::post()
            .uri(uri)
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
    }

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"clip").unwrap();
    }

    #[actix_web::test]
    async fn uploaded_clip_is_listed_without_prefix_or_extension() {
        let state = make_state("api-upload-own");
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        let req = upload_request("/own-files/upload", "customTTS", "Welcome home.mp3", b"ID3audio").to_request();
        let ack: StatusAck = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ack, StatusAck::default());

        let req = test::TestRequest::get().uri("/own-files").to_request();
        let files: Vec<StoredFileEntry> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            files,
            vec![StoredFileEntry {
                name: "Welcome home".to_string(),
                filename: "OwnFile_Welcome home.mp3".to_string(),
            }]
        );
        let stored = state.stores.dir(StoreCategory::Permanent).join("OwnFile_Welcome home.mp3");
        assert_eq!(std::fs::read(stored).unwrap(), b"ID3audio");
    }

    #[actix_web::test]
    async fn hailing_upload_uses_hailing_prefix() {
        let state = make_state("api-upload-hailing");
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        let req = upload_request("/hailing-files/upload", "customHailing", "Bell.mp3", b"ding").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::get().uri("/hailing-files").to_request();
        let files: Vec<StoredFileEntry> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "Bell");
        assert_eq!(files[0].filename, "Hailing_Bell.mp3");
    }

    #[actix_web::test]
    async fn disallowed_extension_is_acknowledged_but_not_stored() {
        let state = make_state("api-upload-reject");
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        for name in ["notes.txt", "loud.MP3", "clip.wav"] {
            let req = upload_request("/own-files/upload", "customTTS", name, b"data").to_request();
            let ack: StatusAck = test::call_and_read_body_json(&app, req).await;
            assert_eq!(ack.status, 220);
        }
        let req = upload_request("/own-files/upload", "wrongField", "ok.mp3", b"data").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::get().uri("/own-files").to_request();
        let files: Vec<StoredFileEntry> = test::call_and_read_body_json(&app, req).await;
        assert!(files.is_empty());
        let spool = std::fs::read_dir(state.spool_dir())
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(spool, 0);
    }

    #[actix_web::test]
    async fn malformed_upload_still_acknowledged() {
        let state = make_state("api-upload-garbage");
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        let req = test::TestRequest::post()
            .uri("/own-files/upload")
            .insert_header((header::CONTENT_TYPE, "text/plain"))
            .set_payload("not multipart")
            .to_request();
        let ack: StatusAck = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ack.status, 220);
    }

    #[actix_web::test]
    async fn delete_one_leaves_other_entries() {
        let state = make_state("api-delete-one");
        let dir = state.stores.dir(StoreCategory::Hailing);
        touch(&dir, "Hailing_A.mp3");
        touch(&dir, "Hailing_B.mp3");
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        let req = test::TestRequest::get()
            .uri("/hailing-files/delete?FileName=Hailing_A.mp3")
            .to_request();
        let ack: StatusAck = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ack.status, 220);

        let req = test::TestRequest::get().uri("/hailing-files").to_request();
        let files: Vec<StoredFileEntry> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "Hailing_B.mp3");
    }

    #[actix_web::test]
    async fn delete_missing_file_is_acknowledged() {
        let state = make_state("api-delete-missing");
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        for uri in [
            "/own-files/delete?FileName=OwnFile_nope.mp3",
            "/own-files/delete",
            "/hailing-files/delete?FileName=..%2F..%2Fetc%2Fpasswd",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let ack: StatusAck = test::call_and_read_body_json(&app, req).await;
            assert_eq!(ack.status, 220);
        }
    }

    #[actix_web::test]
    async fn bulk_delete_removes_only_prefixed_files() {
        let state = make_state("api-delete-all");
        let dir = state.stores.dir(StoreCategory::Permanent);
        touch(&dir, "OwnFile_A.mp3");
        touch(&dir, "OwnFile_B.mp3");
        touch(&dir, "readme.txt");
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        let req = test::TestRequest::get()
            .uri("/own-files/delete?FileName=DELETEallFiles")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::get().uri("/own-files").to_request();
        let files: Vec<StoredFileEntry> = test::call_and_read_body_json(&app, req).await;
        assert!(files.is_empty());
        assert!(dir.join("readme.txt").exists());
    }

    #[actix_web::test]
    async fn listing_missing_store_is_empty() {
        let state = make_state("api-missing-store");
        std::fs::remove_dir_all(state.stores.dir(StoreCategory::Hailing)).unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        let req = test::TestRequest::get().uri("/hailing-files").to_request();
        let files: Vec<StoredFileEntry> = test::call_and_read_body_json(&app, req).await;
        assert!(files.is_empty());
    }

    #[actix_web::test]
    async fn discovery_failure_returns_sentinel() {
        let stores = StoreLayout::new(temp_root("api-discovery"));
        let state = web::Data::new(AppState::new(
            stores,
            Arc::new(UnconfiguredSpeech),
            Arc::new(FailingDiscovery),
            None,
            1980,
        ));
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        let req = test::TestRequest::get().uri("/playback-groups").to_request();
        let body: String = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, "ERRORDISCOVERY");

        let req = test::TestRequest::get().uri("/voices").to_request();
        let voices: Vec<VoiceEntry> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].id, "Ivy");
    }

    #[actix_web::test]
    async fn health_reports_crate_version() {
        let app = test::init_service(App::new().configure(super::configure)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let health: tts_hub_types::HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn eth_address_is_a_json_string() {
        let app = test::init_service(App::new().configure(super::configure)).await;

        let req = test::TestRequest::get().uri("/eth-address").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let text = body.as_str().expect("string body");
        assert!(text == crate::net::NO_INTERFACE || text.parse::<std::net::Ipv4Addr>().is_ok());
    }

    #[actix_web::test]
    async fn playback_groups_are_listed() {
        let state = make_state("api-groups");
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        let req = test::TestRequest::get().uri("/playback-groups").to_request();
        let groups: Vec<PlaybackGroup> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(groups[0].name, "Kitchen");
    }

    #[actix_web::test]
    async fn say_records_last_owner_and_returns_stream_url() {
        let state = make_state("api-say");
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        for client in ["flow-a", "flow-b"] {
            let req = test::TestRequest::post()
                .uri("/say")
                .set_json(SayRequest {
                    client_id: client.to_string(),
                    text: "Dinner is ready".to_string(),
                    voice_id: "Amy".to_string(),
                })
                .to_request();
            let resp: SayResponse = test::call_and_read_body_json(&app, req).await;
            assert!(resp.url.starts_with("http://192.168.1.20:1980/?f="));
            assert!(resp.stream_available);
            assert!(Path::new(&resp.path).exists());
        }

        let req = test::TestRequest::get().uri("/owner").to_request();
        let owner: OwnerResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(owner.owner.as_deref(), Some("flow-b"));

        let req = test::TestRequest::get().uri("/cache-files").to_request();
        let cached: Vec<StoredFileEntry> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cached.len(), 1);
    }

    #[actix_web::test]
    async fn say_flags_unreachable_stream_url() {
        let state = make_state("api-say-no-stream");
        state.set_stream_listening(false);
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        let req = test::TestRequest::post()
            .uri("/say")
            .set_json(SayRequest {
                client_id: "flow-a".to_string(),
                text: "Door open".to_string(),
                voice_id: "Amy".to_string(),
            })
            .to_request();
        let resp: SayResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!resp.stream_available);
        assert!(Path::new(&resp.path).exists());
    }

    #[actix_web::test]
    async fn say_reports_upstream_failure() {
        let stores = StoreLayout::new(temp_root("api-say-fail"));
        std::fs::create_dir_all(stores.dir(StoreCategory::Cache)).unwrap();
        let state = web::Data::new(AppState::new(
            stores,
            Arc::new(UnconfiguredSpeech),
            Arc::new(StaticDiscovery),
            None,
            1980,
        ));
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::configure)).await;

        let req = test::TestRequest::post()
            .uri("/say")
            .set_json(SayRequest {
                client_id: "flow-a".to_string(),
                text: "hello".to_string(),
                voice_id: "Amy".to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_GATEWAY);
        assert_eq!(state.active.owner().as_deref(), Some("flow-a"));
    }
}
