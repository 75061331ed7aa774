//! Download-URL exchange and bundle streaming.
//!
//! Downloading a bundle is two sequential calls: an authenticated POST that
//! trades a media id plus a usage attestation for a short-lived signed URL,
//! then an authenticated GET of that URL streamed into a sink. There is no
//! retry, resume or checksum; a failed stream leaves a partial sink behind.

use futures_util::StreamExt;
use serde_json::Value;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::models::DownloadConfig;
use crate::utils::Transport;

/// Largest write handed to the sink, in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// Start of the [`ApiError::RestrictedDownload`] message; the media id follows.
pub const RESTRICTED_DOWNLOAD_MSG: &str =
    "You do not have authorization to download this restricted media.\n\
     Please visit https://www.morphosource.org and request download permission for media id:";

/// Message of the restricted-download error for `media_id`
pub fn restricted_download_message(media_id: &str) -> String {
    format!("{} {}", RESTRICTED_DOWNLOAD_MSG, media_id)
}

/// Exchange a media id and usage attestation for a signed download URL.
///
/// A 404 from this endpoint means the key is not authorized for the media and
/// becomes [`ApiError::RestrictedDownload`]; other failures pass through.
pub async fn get_download_url(
    transport: &dyn Transport,
    api_url: &str,
    media_id: &str,
    config: &DownloadConfig,
) -> Result<String, ApiError> {
    let url = format!(
        "{}/download/{}",
        api_url.trim_end_matches('/'),
        urlencoding::encode(media_id)
    );
    let body = serde_json::to_value(config.request_body())?;

    debug!(media_id, "Requesting download URL");
    let response = match transport.post_json(&url, config.api_key(), &body).await {
        Ok(response) => response,
        Err(err) if err.is_http_not_found() => {
            warn!(media_id, "Download refused, media is restricted");
            return Err(ApiError::RestrictedDownload(restricted_download_message(
                media_id,
            )));
        }
        Err(err) => return Err(err),
    };

    extract_download_url(&response)
}

/// Read `response.media.download_url`, which is a string or a one-element list.
fn extract_download_url(body: &Value) -> Result<String, ApiError> {
    let value = body
        .pointer("/response/media/download_url")
        .ok_or_else(|| ApiError::Parse("Missing response.media.download_url".to_string()))?;

    let url = match value {
        Value::Array(values) => values.first().and_then(Value::as_str),
        other => other.as_str(),
    };

    url.filter(|u| !u.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Parse(format!("Unusable download_url: {}", value)))
}

/// Stream `url` into `sink`, writing at most `chunk_size` bytes at a time.
///
/// Returns the number of bytes written. The sink is flushed on success only.
pub async fn download_file<W>(
    transport: &dyn Transport,
    url: &str,
    api_key: &str,
    sink: &mut W,
    chunk_size: usize,
) -> Result<u64, ApiError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if chunk_size == 0 {
        return Err(ApiError::InvalidConfig(
            "chunk_size must be at least 1".to_string(),
        ));
    }

    let mut stream = transport.get_stream(url, api_key).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for piece in chunk.chunks(chunk_size) {
            sink.write_all(piece).await?;
            written += piece.len() as u64;
        }
    }

    sink.flush().await?;
    Ok(written)
}

/// Exchange for a signed URL, then stream the bundle into `sink`.
pub async fn download_media_bundle_to<W>(
    transport: &dyn Transport,
    api_url: &str,
    media_id: &str,
    sink: &mut W,
    config: &DownloadConfig,
) -> Result<u64, ApiError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let download_url = get_download_url(transport, api_url, media_id, config).await?;
    download_file(
        transport,
        &download_url,
        config.api_key(),
        sink,
        DEFAULT_CHUNK_SIZE,
    )
    .await
}

/// Exchange for a signed URL, then stream the bundle into a file at `path`.
///
/// The file is only created once the exchange succeeds. If streaming fails
/// every byte received so far is flushed to the file, which is left in
/// place; callers should discard it.
pub async fn download_media_bundle(
    transport: &dyn Transport,
    api_url: &str,
    media_id: &str,
    path: &Path,
    config: &DownloadConfig,
) -> Result<u64, ApiError> {
    let download_url = get_download_url(transport, api_url, media_id, config).await?;

    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    let bytes = match download_file(
        transport,
        &download_url,
        config.api_key(),
        &mut writer,
        DEFAULT_CHUNK_SIZE,
    )
    .await
    {
        Ok(bytes) => bytes,
        Err(err) => {
            // Keep what was already received on disk.
            writer.flush().await?;
            warn!(media_id, path = %path.display(), "Download failed, partial file left behind");
            return Err(err);
        }
    };

    info!(media_id, bytes, path = %path.display(), "Downloaded media bundle");
    Ok(bytes)
}
