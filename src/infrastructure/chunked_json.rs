// Chunked JSON streaming of live dashboard snapshots
use crate::domain::dashboard::LiveDashboard;
use crate::infrastructure::http_response::brotli_compress;
use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode, header};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Set on compressed streams: every chunk is a 4-byte big-endian length
/// followed by one brotli-compressed JSON document.
pub const CHUNK_ENCODING_HEADER: &str = "x-chunk-encoding";

/// Create a chunked streaming response with one JSON document per chunk.
///
/// Uncompressed streams are plain NDJSON. We do NOT set Content-Encoding for
/// compressed streams because the chunks are compressed individually, not
/// the response as a whole.
pub fn chunked_json_stream<S, T>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + Send + Sync + 'static,
{
    let byte_stream = stream.then(move |item| async move { serialize_chunk(&item, compress).await });

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache");
    if compress {
        response = response.header(CHUNK_ENCODING_HEADER, HeaderValue::from_static("br-length-prefixed"));
    }

    response
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn serialize_chunk<T: Serialize>(item: &T, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(item).map_err(std::io::Error::other)?;

    if !compress {
        let mut chunk = BytesMut::with_capacity(json.len() + 1);
        chunk.put_slice(&json);
        chunk.put_u8(b'\n');
        return Ok(chunk.freeze());
    }

    let payload = brotli_compress(&json).await?;
    let length = u32::try_from(payload.len()).map_err(std::io::Error::other)?;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);
    Ok(chunk.freeze())
}

/// Streams the current dashboard and then every change to it until the
/// client disconnects.
pub fn stream_from_watch(receiver: watch::Receiver<LiveDashboard>, compress: bool) -> impl IntoResponse {
    match chunked_json_stream(WatchStream::new(receiver), compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
