//! Bridges a blocking backup into a streaming HTTP response

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::io;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::handlers::ApiError;
use crate::storage::{AlertStore, BackupMetadata, BackupSink, StoreError};

/// Chunks buffered between the store thread and the response body
const CHANNEL_CAPACITY: usize = 16;

type Chunk = Result<Bytes, io::Error>;

/// Backup sink feeding a response body from the blocking pool
///
/// Until `begin` is called a failure can still become an error response.
/// After that the headers are gone, so a failure aborts the body instead.
struct ChannelSink {
    head: Option<oneshot::Sender<Result<BackupMetadata, StoreError>>>,
    body: mpsc::Sender<Chunk>,
}

impl ChannelSink {
    fn new(
        head: oneshot::Sender<Result<BackupMetadata, StoreError>>,
        body: mpsc::Sender<Chunk>,
    ) -> Self {
        Self {
            head: Some(head),
            body,
        }
    }
}

impl io::Write for ChannelSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body
            .blocking_send(Ok(Bytes::copy_from_slice(buf)))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "backup client went away"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl BackupSink for ChannelSink {
    fn begin(&mut self, meta: &BackupMetadata) {
        if let Some(head) = self.head.take() {
            let _ = head.send(Ok(meta.clone()));
        }
    }

    fn fail(&mut self, err: StoreError) {
        tracing::warn!("Backup failed: {}", err);
        match self.head.take() {
            Some(head) => {
                let _ = head.send(Err(err));
            }
            None => {
                let _ = self
                    .body
                    .blocking_send(Err(io::Error::new(io::ErrorKind::Other, err.to_string())));
            }
        }
    }
}

/// Run a backup on the blocking pool and stream it as the response
pub async fn backup_response(store: Arc<dyn AlertStore>) -> Result<Response, ApiError> {
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel::<Chunk>(CHANNEL_CAPACITY);

    tokio::task::spawn_blocking(move || {
        let mut sink = ChannelSink::new(head_tx, body_tx);
        store.backup(&mut sink);
    });

    let meta = match head_rx.await {
        Ok(Ok(meta)) => meta,
        Ok(Err(e)) => return Err(ApiError::Internal(e.to_string())),
        Err(_) => return Err(ApiError::Internal("backup ended without output".to_string())),
    };

    let chunks = futures::stream::unfold(body_rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });

    let disposition = HeaderValue::from_str(&meta.content_disposition)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(meta.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(meta.content_length)),
        ],
        Body::from_stream(chunks),
    )
        .into_response())
}
