use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use crate::error::{CopilotError, Result};

/// Central broker that funnels ALL game API requests through one worker.
/// Requests run one at a time with a minimum spacing, and a 429 puts the
/// whole queue into exponential backoff.
#[derive(Clone)]
pub struct ApiRequestBroker {
    request_sender: mpsc::UnboundedSender<ApiRequest>,
}

/// API request that gets queued through the broker
pub struct ApiRequest {
    pub url: String,
    pub body: serde_json::Value,
    pub response_sender: oneshot::Sender<Result<ApiResponse>>,
}

/// Raw response handed back to the caller
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct BrokerSettings {
    pub min_interval: Duration,
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(250),
            timeout: Duration::from_secs(30),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Internal broker state
struct BrokerState {
    client: reqwest::Client,
    settings: BrokerSettings,
    last_request_time: Option<Instant>,
    backoff_until: Option<Instant>,
    current_backoff_duration: Duration,
    request_count: u64,
}

impl ApiRequestBroker {
    /// Create a new API broker and start the background processing loop.
    /// Must be called from inside a tokio runtime.
    pub fn new(client: reqwest::Client, settings: BrokerSettings) -> Self {
        let (request_sender, request_receiver) = mpsc::unbounded_channel();

        tokio::spawn(Self::broker_worker(client, settings, request_receiver));

        Self { request_sender }
    }

    /// Submit a POST request through the broker and wait for its response
    pub async fn request(&self, url: &str, body: serde_json::Value) -> Result<ApiResponse> {
        let (response_sender, response_receiver) = oneshot::channel();

        let request = ApiRequest {
            url: url.to_string(),
            body,
            response_sender,
        };

        self.request_sender
            .send(request)
            .map_err(|_| CopilotError::Broker)?;

        response_receiver.await.map_err(|_| CopilotError::Broker)?
    }

    async fn broker_worker(
        client: reqwest::Client,
        settings: BrokerSettings,
        mut request_receiver: mpsc::UnboundedReceiver<ApiRequest>,
    ) {
        let mut state = BrokerState {
            client,
            current_backoff_duration: settings.initial_backoff,
            settings,
            last_request_time: None,
            backoff_until: None,
            request_count: 0,
        };

        info!("🌐 API request broker started");

        while let Some(request) = request_receiver.recv().await {
            Self::handle_request(&mut state, request).await;
        }

        info!("⚠️ API request broker stopped");
    }

    /// Handle a single API request with proper rate limiting
    async fn handle_request(state: &mut BrokerState, request: ApiRequest) {
        if let Some(backoff_until) = state.backoff_until.take() {
            let now = Instant::now();
            if now < backoff_until {
                let wait_duration = backoff_until - now;
                debug!(target: "api", "🌐 Global backoff: waiting {:.1}s before next request", wait_duration.as_secs_f64());
                sleep(wait_duration).await;
            }
        }

        if let Some(last_time) = state.last_request_time {
            let elapsed = last_time.elapsed();
            if elapsed < state.settings.min_interval {
                sleep(state.settings.min_interval - elapsed).await;
            }
        }

        state.last_request_time = Some(Instant::now());
        state.request_count += 1;

        let result = Self::execute_http_request(state, &request).await;

        if let Ok(ref response) = result {
            if response.status == 429 {
                debug!(target: "api", "🌐 429 rate limited - backing off {:.1}s",
                    state.current_backoff_duration.as_secs_f64());

                state.backoff_until = Some(Instant::now() + state.current_backoff_duration);
                state.current_backoff_duration = std::cmp::min(
                    state.current_backoff_duration * 2,
                    state.settings.max_backoff,
                );
            } else {
                state.current_backoff_duration = state.settings.initial_backoff;
            }
        }

        if request.response_sender.send(result).is_err() {
            warn!("⚠️ Failed to deliver API response - caller dropped receiver");
        }
    }

    async fn execute_http_request(state: &BrokerState, request: &ApiRequest) -> Result<ApiResponse> {
        trace!(target: "api", "🌐 API[{}] POST {}", state.request_count, request.url);

        let response = state
            .client
            .post(&request.url)
            .json(&request.body)
            .timeout(state.settings.timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            debug!(target: "api", "🌐 API[{}] Response: {} ({})", state.request_count, status,
                body.chars().take(100).collect::<String>());
        }

        Ok(ApiResponse { status, body })
    }
}
