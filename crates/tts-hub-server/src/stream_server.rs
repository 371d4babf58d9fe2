//! Standalone streaming listener for playback devices.
//!
//! Path-agnostic: any GET carries the absolute file path in the `f` query
//! parameter. Missing files answer `200 File not found` because the devices
//! fetching clips only understand that contract.

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use actix_web::http::header;
use actix_web::web::Bytes;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use anyhow::{Context, Result};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::listener::BoundServer;

/// File name advertised in the attachment disposition.
pub const ATTACHMENT_NAME: &str = "tts.mp3";
/// Body returned for a path that does not exist.
pub const NOT_FOUND_BODY: &str = "File not found";

#[derive(Deserialize)]
struct StreamQuery {
    f: Option<String>,
}

/// Build the stream URL a playback device uses to fetch `path`.
pub fn stream_url(host: &str, port: u16, path: &Path) -> String {
    format!(
        "http://{host}:{port}/?f={}",
        urlencoding::encode(&path.to_string_lossy())
    )
}

/// Bind the streaming listener and start serving in the background.
pub fn start(addr: SocketAddr) -> Result<BoundServer> {
    let http = HttpServer::new(|| App::new().default_service(web::to(stream_file)))
        .workers(2)
        .disable_signals()
        .shutdown_timeout(5)
        .bind(addr)
        .with_context(|| format!("bind streaming server {addr}"))?;
    let addrs = http.addrs();
    Ok(BoundServer::spawn("stream", http.run(), addrs))
}

/// Serve the file named by `?f=` as an attachment.
pub async fn stream_file(req: HttpRequest) -> HttpResponse {
    let path = web::Query::<StreamQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().f)
        .filter(|f| !f.is_empty())
        .map(PathBuf::from);
    let Some(path) = path else {
        tracing::error!(query = %req.query_string(), "stream request without file path");
        return not_found();
    };

    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !is_file {
        tracing::error!(path = %path.display(), "stream file not found");
        return not_found();
    }

    let Some(file) = open_clip(&path).await else {
        return not_found();
    };

    let content_type = if crate::upload::has_extension(&path.to_string_lossy(), "mp3") {
        "audio/mpeg"
    } else {
        "application/octet-stream"
    };
    let body = until_read_error(ReaderStream::new(file), path);

    HttpResponse::Ok()
        .insert_header(attachment())
        .insert_header((header::CONTENT_TYPE, content_type))
        .streaming(body)
}

/// Open a clip that passed the existence check; it may be deleted in between.
async fn open_clip(path: &Path) -> Option<tokio::fs::File> {
    match tokio::fs::File::open(path).await {
        Ok(file) => Some(file),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "error opening stream");
            None
        }
    }
}

/// Forward chunks until the first read error, which is logged and ends the body.
fn until_read_error<S>(
    chunks: S,
    path: PathBuf,
) -> impl Stream<Item = Result<Bytes, actix_web::Error>> + 'static
where
    S: Stream<Item = io::Result<Bytes>> + 'static,
{
    chunks.scan((), move |_, chunk| {
        let next = match chunk {
            Ok(bytes) => Some(Ok::<Bytes, actix_web::Error>(bytes)),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "stream read failed; ending response");
                None
            }
        };
        futures_util::future::ready(next)
    })
}

fn attachment() -> (header::HeaderName, String) {
    (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename={ATTACHMENT_NAME}"),
    )
}

fn not_found() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(attachment())
        .content_type("text/plain; charset=utf-8")
        .body(NOT_FOUND_BODY)
}
