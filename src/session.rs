//! One client exchange, from the first header byte to the closed socket.
//!
//! ```text
//! AwaitingLength -> AwaitingPayload -> Validating -> Fetching -> Responding -> Closed
//! ```
//!
//! The acknowledgement is sent as soon as the payload arrives, before the
//! request is even parsed. Parse and validation failures skip straight to
//! `Responding` with the error text; protocol failures close the socket
//! without a reply.

use rand::Rng;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::{debug, trace, warn};

use crate::catalog::{CatalogProvider, NameCatalog, NameRecord};
use crate::config::Config;
use crate::error::{FrameError, SessionError};
use crate::protocol::FramedChannel;
use crate::validator::Request;

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingLength,
    AwaitingPayload,
    Validating,
    Fetching,
    Responding,
    Closed,
}

/// How a session ended without a protocol error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The client sent no message.
    NoRequest,
    /// Names were sent.
    Answered,
    /// The request was malformed or invalid; carries the text sent.
    Rejected(String),
    /// The catalog failed; carries the text sent.
    CatalogFailed(String),
}

/// Wire settings shared by every session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub header_width: usize,
    pub ack_message: String,
    pub max_message_size: usize,
    pub read_timeout: Option<Duration>,
    pub linger_timeout: Duration,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            header_width: config.header_width,
            ack_message: config.ack_message.clone(),
            max_message_size: config.max_message_size,
            read_timeout: config.read_timeout,
            linger_timeout: config.linger_timeout,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            header_width: crate::protocol::DEFAULT_HEADER_WIDTH,
            ack_message: "Message received".to_string(),
            max_message_size: 1024 * 1024,
            read_timeout: Some(Duration::from_secs(30)),
            linger_timeout: Duration::from_secs(3),
        }
    }
}

/// The final message of an exchange.
enum Reply {
    Names(Vec<NameRecord>),
    Text(String),
}

impl Reply {
    fn into_payload(self) -> Vec<u8> {
        match self {
            Reply::Names(records) => serde_json::to_vec(&records).unwrap_or_else(|e| {
                warn!(error = %e, "Failed to encode names");
                Vec::new()
            }),
            Reply::Text(text) => text.into_bytes(),
        }
    }
}

/// A single client connection.
pub struct Session<'a, S> {
    channel: FramedChannel<S>,
    settings: &'a SessionSettings,
    state: SessionState,
}

impl<'a, S> Session<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, settings: &'a SessionSettings) -> Self {
        Self {
            channel: FramedChannel::with_limits(
                stream,
                settings.header_width,
                settings.max_message_size,
            ),
            settings,
            state: SessionState::AwaitingLength,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the exchange to completion. The stream is shut down on return.
    pub async fn run<P, R>(
        mut self,
        catalog: &NameCatalog<P>,
        rng: &mut R,
    ) -> Result<Outcome, SessionError>
    where
        P: CatalogProvider,
        R: Rng + Send,
    {
        let result = self.exchange(catalog, rng).await;
        self.close().await;
        result
    }

    async fn exchange<P, R>(
        &mut self,
        catalog: &NameCatalog<P>,
        rng: &mut R,
    ) -> Result<Outcome, SessionError>
    where
        P: CatalogProvider,
        R: Rng + Send,
    {
        let Some(payload) = self.read_request().await? else {
            debug!("No request received");
            return Ok(Outcome::NoRequest);
        };

        self.channel
            .send_message(self.settings.ack_message.as_bytes())
            .await?;

        self.transition(SessionState::Validating);
        let criteria = match Request::from_payload(&payload).and_then(|r| r.criteria()) {
            Ok(criteria) => criteria,
            Err(e) => {
                debug!(error = %e, "Rejected request");
                let text = e.to_string();
                self.respond(Reply::Text(text.clone())).await?;
                return Ok(Outcome::Rejected(text));
            }
        };

        self.transition(SessionState::Fetching);
        debug!(gender = %criteria.gender, letter = %criteria.letter, "Fetching names");
        match catalog.fetch(criteria, rng).await {
            Ok(records) => {
                self.respond(Reply::Names(records)).await?;
                Ok(Outcome::Answered)
            }
            Err(e) => {
                warn!(error = %e, "Catalog lookup failed");
                let text = e.client_message().to_string();
                self.respond(Reply::Text(text.clone())).await?;
                Ok(Outcome::CatalogFailed(text))
            }
        }
    }

    async fn read_request(&mut self) -> Result<Option<bytes::Bytes>, SessionError> {
        let limit = self.settings.read_timeout;
        let read = async {
            match self.channel.read_length().await {
                Ok(Some(len)) => {
                    self.transition(SessionState::AwaitingPayload);
                    self.channel.read_payload(len).await.map(Some)
                }
                Ok(None) => Ok(None),
                Err(e) => Err(e),
            }
        };

        match limit {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| SessionError::ReadTimeout)?
                .map_err(SessionError::from),
            None => read.await.map_err(SessionError::from),
        }
    }

    async fn respond(&mut self, reply: Reply) -> Result<(), FrameError> {
        self.transition(SessionState::Responding);
        let payload = reply.into_payload();
        if payload.is_empty() {
            return Ok(());
        }
        self.channel.send_message(&payload).await
    }

    /// Shut down our write half, then wait for the client to close so the
    /// reply is not cut off by a reset.
    async fn close(&mut self) {
        self.transition(SessionState::Closed);

        if let Err(e) = self.channel.shutdown().await {
            trace!(error = %e, "Shutdown failed");
            return;
        }

        let linger = self.settings.linger_timeout;
        let stream = self.channel.get_mut();
        let drain = async {
            let mut buf = [0u8; 512];
            loop {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => trace!(n, "Discarded trailing client bytes"),
                }
            }
        };

        if tokio::time::timeout(linger, drain).await.is_err() {
            debug!("Client did not close before the linger timeout");
        }
    }

    fn transition(&mut self, next: SessionState) {
        trace!(from = ?self.state, to = ?next, "Session state");
        self.state = next;
    }
}
