//! Download and media handlers.

use std::io::{self, BufWriter, Write};
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::header,
    response::Response,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::io::ReaderStream;

use super::{blocking, AppState};
use crate::file::{DirArchive, Download, EntryKind};
use crate::web::dto::{DownloadQuery, MediaQuery};
use crate::web::error::ApiError;

/// Chunks in flight between the blocking writer and the response body.
const STREAM_BUFFER: usize = 8;

/// Bytes per chunk sent to the client.
const CHUNK_SIZE: usize = 64 * 1024;

/// Generate a safe Content-Disposition header value for downloads.
///
/// Control characters are dropped and quotes replaced in the plain
/// `filename` parameter; non-ASCII names additionally get an RFC 5987
/// `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && sanitized == filename {
        return format!("attachment; filename=\"{filename}\"");
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized,
        urlencoding::encode(filename)
    )
}

/// `io::Write` end of a response body fed from a blocking thread.
struct ChannelWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .blocking_send(Ok(Bytes::copy_from_slice(buf)))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Stream whatever `produce` writes as a response body.
///
/// Used for archives, which are built by synchronous encoders.
///
/// `produce` runs on the blocking pool. A write error ends the body with
/// that error, so the client sees a truncated transfer rather than a
/// short success.
fn streamed_body<F>(produce: F) -> Body
where
    F: FnOnce(&mut dyn Write) -> io::Result<()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(STREAM_BUFFER);

    tokio::task::spawn_blocking(move || {
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, ChannelWriter { tx: tx.clone() });
        let result = produce(&mut writer).and_then(|()| writer.flush());
        if let Err(e) = result {
            if e.kind() != io::ErrorKind::BrokenPipe {
                tracing::warn!(error = %e, "Download stream failed");
                let _ = tx.blocking_send(Err(e));
            }
        }
    });

    Body::from_stream(ReceiverStream::new(rx))
}

fn build(builder: axum::http::response::Builder, body: Body) -> Result<Response, ApiError> {
    builder.body(body).map_err(|e| {
        tracing::error!("Failed to build response: {}", e);
        ApiError::internal("Failed to build response")
    })
}

fn archive_response(archive: DirArchive) -> Result<Response, ApiError> {
    let filename = archive.file_name();
    let body = streamed_body(move |writer| archive.write_to(writer).map(|_| ()));

    build(
        Response::builder()
            .header(header::CONTENT_TYPE, DirArchive::MIME)
            .header(
                header::CONTENT_DISPOSITION,
                content_disposition_header(&filename),
            ),
        body,
    )
}

/// GET /api/download - Download a file, or a directory as `<name>.tar.gz`.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let kind = EntryKind::from(query.kind);
    let download = blocking(move || state.engine.root().open_download(&query.path, kind)).await??;

    match download {
        Download::File(file) => {
            tracing::info!(name = %file.name, bytes = file.len, "Serving file download");
            let disposition = content_disposition_header(&file.name);
            let builder = Response::builder()
                .header(header::CONTENT_TYPE, file.mime)
                .header(header::CONTENT_DISPOSITION, disposition)
                .header(header::CONTENT_LENGTH, file.len);
            let source = tokio::fs::File::from_std(file.file);
            build(
                builder,
                Body::from_stream(ReaderStream::with_capacity(source, CHUNK_SIZE)),
            )
        }
        Download::Directory(archive) => {
            tracing::info!(name = %archive.file_name(), "Serving directory archive");
            archive_response(archive)
        }
    }
}

/// GET /api/media - Raw file content for previews and thumbnails.
pub async fn media(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MediaQuery>,
) -> Result<Response, ApiError> {
    let media = blocking(move || state.engine.root().open_media(&query.path)).await??;

    build(
        Response::builder()
            .header(header::CONTENT_TYPE, media.mime)
            .header(header::CACHE_CONTROL, "max-age=3600"),
        Body::from(media.bytes),
    )
}
