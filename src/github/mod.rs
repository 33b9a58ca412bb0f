// GitHub notifications service
//
// Uses a worker thread with its own tokio runtime so HTTP requests never
// block the bar's event loop. Results are handed back over a calloop channel.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use calloop::channel::{sync_channel, Channel, SyncSender};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::error::{GithubError, GithubResult};

/// Default notifications endpoint
pub const NOTIFICATIONS_API: &str = "https://api.github.com/notifications";

/// Page shown when the widget is clicked
pub const NOTIFICATIONS_PAGE: &str = "https://github.com/notifications";

const PER_PAGE: usize = 50;
const MAX_PAGES: usize = 10;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// OAuth application credentials, read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl GithubCredentials {
    /// `GITHUB_CLIENT_ID` and `GITHUB_CLIENT_SECRET`; both must be non-empty
    pub fn from_env() -> Option<Self> {
        Self::from_values(
            std::env::var("GITHUB_CLIENT_ID").ok(),
            std::env::var("GITHUB_CLIENT_SECRET").ok(),
        )
    }

    fn from_values(client_id: Option<String>, client_secret: Option<String>) -> Option<Self> {
        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(Self {
                    client_id,
                    client_secret,
                })
            }
            _ => None,
        }
    }
}

/// Unread notification counts keyed by reason ("mention", "review_requested", ...)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notifications {
    counts: BTreeMap<String, u32>,
}

impl Notifications {
    pub fn from_reasons<I, S>(reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts = BTreeMap::new();
        for reason in reasons {
            *counts.entry(reason.into()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, reason: &str) -> u32 {
        self.counts.get(reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Direct and team mentions
    pub fn mentions(&self) -> u32 {
        self.get("mention") + self.get("team_mention")
    }
}

/// One notification thread as returned by the API (only the fields we use)
#[derive(Debug, Deserialize)]
struct NotificationThread {
    reason: String,
}

/// Polls the notifications API in a background thread
pub struct GithubService {
    sender: SyncSender<GithubResult<Notifications>>,
    channel: Channel<GithubResult<Notifications>>,
}

impl GithubService {
    pub fn new() -> Self {
        let (sender, channel) = sync_channel(1);
        Self { sender, channel }
    }

    /// Start polling `api_url` every `interval`, consuming the service and
    /// returning the channel to insert into the bar's event loop.
    pub fn start_polling(
        self,
        token: String,
        api_url: String,
        interval: Duration,
    ) -> Channel<GithubResult<Notifications>> {
        let sender = self.sender;

        info!(
            url = %api_url,
            interval_secs = interval.as_secs(),
            "Starting GitHub notifications thread"
        );

        thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!(error = %e, "Failed to create tokio runtime for GitHub polling");
                    return;
                }
            };

            let client = match http_client() {
                Ok(client) => client,
                Err(e) => {
                    error!(error = %e, "Failed to build HTTP client");
                    let _ = sender.send(Err(e));
                    return;
                }
            };

            loop {
                debug!("Fetching GitHub notifications");
                let result = rt.block_on(fetch_with_retry(
                    &client,
                    &api_url,
                    &token,
                    INITIAL_BACKOFF,
                ));
                let unauthorized = matches!(result, Err(GithubError::Unauthorized));

                if let Ok(n) = &result {
                    debug!(total = n.total(), mentions = n.mentions(), "GitHub notifications fetched");
                }

                if sender.send(result).is_err() {
                    error!("GitHub channel disconnected, stopping fetch thread");
                    break;
                }

                if unauthorized {
                    error!("GitHub token rejected, stopping fetch thread");
                    break;
                }

                thread::sleep(interval);
            }
        });

        self.channel
    }
}

impl Default for GithubService {
    fn default() -> Self {
        Self::new()
    }
}

fn http_client() -> GithubResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("i3-statusline/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()?)
}

/// Fetch with up to [`MAX_ATTEMPTS`] tries, doubling the pause after each
/// transient failure. A rejected or missing token is returned at once.
async fn fetch_with_retry(
    client: &reqwest::Client,
    api_url: &str,
    token: &str,
    initial_backoff: Duration,
) -> GithubResult<Notifications> {
    let mut attempts = 0;
    let mut backoff = initial_backoff;

    loop {
        attempts += 1;

        match fetch_notifications(client, api_url, token).await {
            Ok(notifications) => return Ok(notifications),
            Err(e) if !e.is_transient() || attempts >= MAX_ATTEMPTS => {
                warn!(error = %e, attempts = attempts, "GitHub notifications fetch failed");
                return Err(e);
            }
            Err(e) => {
                warn!(
                    error = %e,
                    attempt = attempts,
                    retry_in_ms = backoff.as_millis() as u64,
                    "GitHub notifications fetch failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }
    }
}

/// Fetch all unread notifications, following pages
async fn fetch_notifications(
    client: &reqwest::Client,
    api_url: &str,
    token: &str,
) -> GithubResult<Notifications> {
    if token.is_empty() {
        return Err(GithubError::NoToken);
    }

    let mut reasons = Vec::new();

    for page in 1..=MAX_PAGES {
        let response = client
            .get(api_url)
            .query(&[("per_page", PER_PAGE), ("page", page)])
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GithubError::Unauthorized);
        }
        if !status.is_success() {
            return Err(GithubError::InvalidResponse(format!("HTTP {}", status)));
        }

        let threads: Vec<NotificationThread> = response.json().await?;
        let count = threads.len();
        reasons.extend(threads.into_iter().map(|t| t.reason));

        if count < PER_PAGE {
            break;
        }
    }

    Ok(Notifications::from_reasons(reasons))
}
