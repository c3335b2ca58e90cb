//! One request, one response
//!
//! A session owns the transport. Each request gets its own reassembler, which
//! is dropped once the response frame is complete or the deadline passes, so
//! a late or partial reply can never leak into the next exchange.

use std::time::Duration;

use futures::StreamExt;
use meross_proto::{Checksum, DecodedFrame, Envelope, Method, Reassembler};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::transport::{ChunkStream, Transport};

/// A reassembled response frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub body: Vec<u8>,
    pub checksum: Checksum,
}

impl Response {
    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body, turning an `ERROR` reply into [`Error::DeviceError`].
    pub fn envelope(&self) -> Result<Envelope> {
        let envelope = Envelope::from_bytes(&self.body)?;
        if envelope.is_error() {
            return Err(Error::DeviceError {
                namespace: envelope.header.namespace,
                payload: envelope.payload,
            });
        }
        Ok(envelope)
    }

    pub fn payload(&self) -> Result<Value> {
        Ok(self.envelope()?.payload)
    }
}

impl From<DecodedFrame> for Response {
    fn from(decoded: DecodedFrame) -> Self {
        Self {
            body: decoded.frame.body,
            checksum: decoded.checksum,
        }
    }
}

pub struct Session<T> {
    transport: T,
    timeout: Duration,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub async fn request(&mut self, method: Method, namespace: &str, payload: Value) -> Result<Response> {
        let envelope = Envelope::new(method.as_str(), namespace, payload);
        self.send(&envelope).await
    }

    /// Send a prepared envelope and wait for the reply.
    pub async fn send(&mut self, envelope: &Envelope) -> Result<Response> {
        let frame = envelope.to_frame()?;
        info!(
            method = envelope.method(),
            namespace = envelope.namespace(),
            message_id = %envelope.header.message_id,
            "request"
        );

        // subscribe before writing so a fast reply is not missed
        let mut notifications = self.transport.notifications().await?;

        let chunk_size = self.transport.max_chunk_size();
        debug!(len = frame.len(), chunk_size, "writing frame");
        for chunk in frame.chunks(chunk_size) {
            self.transport.write_chunk(chunk).await?;
        }

        let mut reassembler = Reassembler::new();
        let read = tokio::time::timeout(
            self.timeout,
            read_frame(&mut notifications, &mut reassembler),
        )
        .await;
        let decoded = match read {
            Ok(Ok(Some(decoded))) => decoded,
            // a frame whose length field overruns what arrived never completes
            Ok(Ok(None)) => reassembler.finish()?.ok_or(Error::Disconnected)?,
            Ok(Err(e)) => return Err(e),
            Err(_) => reassembler.finish()?.ok_or(Error::Timeout(self.timeout))?,
        };

        let response = Response::from(decoded);
        debug!(body = %response.text(), valid = response.checksum.is_valid(), "response");
        Ok(response)
    }
}

/// Feed notifications until a frame completes. `None` means the stream
/// ended first.
async fn read_frame(
    notifications: &mut ChunkStream,
    reassembler: &mut Reassembler,
) -> Result<Option<DecodedFrame>> {
    while let Some(chunk) = notifications.next().await {
        debug!(bytes = %data_encoding::HEXLOWER.encode(&chunk), "BLE notify");
        if let Some(decoded) = reassembler.push(&chunk)? {
            return Ok(Some(decoded));
        }
    }
    Ok(None)
}
