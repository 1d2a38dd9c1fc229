use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{error, info, warn};

use super::inlet::AudioInlet;
use super::messages::{StreamingResult, TokenResponse};
use crate::config::RecognitionConfig;

/// Issued tokens are valid for a day; refreshed lazily, never mid-flight.
const TOKEN_TTL: Duration = Duration::from_secs(86_400);
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Send loop backoff while the outbound queue is empty.
const SEND_IDLE_BACKOFF: Duration = Duration::from_millis(10);
/// How long to wait for the close handshake after we send a Close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Lifecycle of the recognition socket. Errors are terminal; a session is
/// never reconnected, the caller creates a new one instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Created,
    Connecting,
    Ready,
    Closing,
    Closed,
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Created => "created",
            LinkState::Connecting => "connecting",
            LinkState::Ready => "ready",
            LinkState::Closing => "closing",
            LinkState::Closed => "closed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("recognition socket error: {0}")]
    Connection(#[from] tungstenite::Error),
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Owns one streaming connection to the recognition provider: token
/// issuance, handshake, and the concurrent send/receive loops.
pub struct RecognitionLink {
    room_id: String,
    config: RecognitionConfig,
    http: reqwest::Client,
    token: Option<CachedToken>,
    state_tx: watch::Sender<LinkState>,
}

impl RecognitionLink {
    pub fn new(room_id: String, config: RecognitionConfig) -> (Self, watch::Receiver<LinkState>) {
        let (state_tx, state_rx) = watch::channel(LinkState::Created);
        (
            Self {
                room_id,
                config,
                http: reqwest::Client::new(),
                token: None,
                state_tx,
            },
            state_rx,
        )
    }

    fn set_state(&self, state: LinkState) {
        self.state_tx.send_replace(state);
    }

    /// Bearer token for the streaming handshake, fetched from the token
    /// endpoint and cached until stale.
    async fn fetch_token(&mut self) -> Result<String, LinkError> {
        if let Some(token) = &self.token {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!("{}/v1/authenticate", self.config.api_base);
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&url)
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .form(&params)
            .send()
            .await
            .map_err(|e| LinkError::Authentication(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LinkError::Authentication(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| LinkError::Authentication(e.to_string()))?;

        info!("recognition token issued for room {}", self.room_id);

        self.token = Some(CachedToken {
            access_token: body.access_token.clone(),
            expires_at: Instant::now() + TOKEN_TTL,
        });

        Ok(body.access_token)
    }

    fn streaming_url(&self) -> String {
        format!(
            "{}/v1/transcribe:streaming?sample_rate={}&encoding={}&use_itn={}&use_disfluency_filter={}&use_profanity_filter={}&use_punctuation={}&use_word_timestamp={}",
            self.config.streaming_base,
            self.config.sample_rate,
            self.config.encoding,
            self.config.use_itn,
            self.config.use_disfluency_filter,
            self.config.use_profanity_filter,
            self.config.use_punctuation,
            self.config.use_word_timestamp,
        )
    }

    /// Connect and stream until shutdown is signalled, the remote closes,
    /// or the socket fails. `on_transcript` is invoked once per finalized
    /// non-empty result, in receipt order.
    pub async fn run<F>(
        mut self,
        inlet: AudioInlet,
        shutdown: watch::Receiver<bool>,
        mut on_transcript: F,
    ) -> Result<(), LinkError>
    where
        F: FnMut(String),
    {
        self.set_state(LinkState::Connecting);

        let result = self.stream(&inlet, shutdown, &mut on_transcript).await;

        self.set_state(LinkState::Closing);
        inlet.close();
        self.set_state(LinkState::Closed);

        result
    }

    async fn stream<F>(
        &mut self,
        inlet: &AudioInlet,
        shutdown: watch::Receiver<bool>,
        on_transcript: &mut F,
    ) -> Result<(), LinkError>
    where
        F: FnMut(String),
    {
        let token = self.fetch_token().await?;

        let mut request = self.streaming_url().into_client_request()?;
        let auth = HeaderValue::from_str(&format!("bearer {token}"))
            .map_err(|e| LinkError::Authentication(e.to_string()))?;
        request.headers_mut().insert("Authorization", auth);

        let (stream, _) = connect_async(request).await?;
        info!("recognition socket connected for room {}", self.room_id);

        self.set_state(LinkState::Ready);
        inlet.mark_ready();

        let (mut write, mut read) = stream.split();

        let send_inlet = inlet.clone();
        let send_loop = async move {
            loop {
                if *shutdown.borrow() {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok::<(), tungstenite::Error>(());
                }
                match send_inlet.pop() {
                    Some(frame) => write.send(Message::Binary(frame)).await?,
                    None => tokio::time::sleep(SEND_IDLE_BACKOFF).await,
                }
            }
        };

        let room_id = self.room_id.clone();
        let recv_loop = async move {
            while let Some(message) = read.next().await {
                match message? {
                    Message::Text(payload) => {
                        match serde_json::from_str::<StreamingResult>(&payload) {
                            Ok(result) => {
                                if let Some(err) = &result.error {
                                    error!("recognition error for room {}: {}", room_id, err);
                                }
                                if let Some(text) = result.final_text() {
                                    on_transcript(text.to_string());
                                }
                            }
                            Err(e) => {
                                warn!("unparsable recognition message for room {}: {}", room_id, e)
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Ok::<(), tungstenite::Error>(())
        };

        tokio::pin!(send_loop);
        tokio::pin!(recv_loop);

        let result = tokio::select! {
            result = &mut recv_loop => result,
            result = &mut send_loop => match result {
                // Shutdown path: give the remote a moment to acknowledge
                // the Close frame so both loops exit cleanly.
                Ok(()) => match tokio::time::timeout(CLOSE_GRACE, &mut recv_loop).await {
                    Ok(result) => result,
                    Err(_) => Ok(()),
                },
                Err(e) => Err(e),
            },
        };

        result.map_err(LinkError::from)
    }
}
