//! Remote audio fetching with platform and content-type guards.
//!
//! [`AudioFetcher`] validates a candidate URL against a denylist of known
//! hosting platforms, performs the network fetch, validates the response,
//! and returns the raw bytes plus display metadata as a
//! [`LoadedAudio`].
//!
//! # Example
//!
//! ```no_run
//! use mp3ify::{AudioFetcher, Mp3ifyError};
//!
//! # async fn example() -> Result<(), Mp3ifyError> {
//! let fetcher = AudioFetcher::new();
//! let audio = fetcher.fetch("https://example.com/music/song.mp3").await?;
//! println!("{} ({})", audio.display_name, audio.mime);
//! # Ok(())
//! # }
//! ```

use url::Url;

use crate::audio::LoadedAudio;
use crate::error::Mp3ifyError;
use crate::naming::{filename_from_url, is_audio_mime, is_direct_audio_url};
use crate::progress::{AttemptToken, ProgressReporter};

/// Hosting platforms whose pages require extraction rather than a plain
/// download. Matched case-insensitively against the URL's host, including
/// subdomains.
const BLOCKED_HOSTS: &[&str] = &["youtube.com", "youtu.be", "soundcloud.com", "spotify.com"];

/// Fallback display name when the URL carries no usable path segment.
const DEFAULT_DISPLAY_NAME: &str = "audio";

/// Fetches remote audio files, rejecting platform links and non-audio
/// responses.
///
/// Construct with [`AudioFetcher::new`], optionally extend the denylist or
/// attach a [`ProgressReporter`], then call
/// [`fetch`](AudioFetcher::fetch).
pub struct AudioFetcher {
    client: reqwest::Client,
    blocked_hosts: Vec<String>,
    reporter: ProgressReporter,
}

impl AudioFetcher {
    /// Create a fetcher with the default denylist and a detached reporter.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            blocked_hosts: BLOCKED_HOSTS.iter().map(|host| host.to_string()).collect(),
            reporter: ProgressReporter::new(),
        }
    }

    /// Use an existing HTTP client (connection pooling across fetches).
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Add a host to the denylist.
    ///
    /// Subdomains of `host` are blocked as well.
    #[must_use]
    pub fn with_blocked_host(mut self, host: impl Into<String>) -> Self {
        self.blocked_hosts.push(host.into().to_ascii_lowercase());
        self
    }

    /// Report progress and status through `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Fetch `url` and return the validated audio bytes.
    ///
    /// The denylist is consulted **before** any network I/O. The response
    /// must have a success status and declare an audio content type
    /// (`audio/*` or exactly `application/ogg`); the content type is the
    /// first `;`-segment of the header, trimmed, defaulting to
    /// `application/octet-stream` when absent.
    ///
    /// On any failure the progress resets to 0 and the status line carries
    /// the failure message.
    ///
    /// # Errors
    ///
    /// - [`Mp3ifyError::UnsupportedPlatform`] for denylisted hosts.
    /// - [`Mp3ifyError::Http`] for non-success status codes.
    /// - [`Mp3ifyError::UnexpectedContentType`] when the server does not
    ///   declare an audio type (the HTTP exchange has completed by then).
    /// - [`Mp3ifyError::EmptyBody`] when the response carries no bytes.
    /// - [`Mp3ifyError::Network`] for transport-level failures.
    pub async fn fetch(&self, url: &str) -> Result<LoadedAudio, Mp3ifyError> {
        let token = self.reporter.begin();
        self.reporter.set_status(&token, "Downloading the file…");

        match self.run_fetch(url, &token).await {
            Ok(audio) => {
                self.reporter.set_status(
                    &token,
                    format!("File loaded: {} ({})", audio.display_name, audio.mime),
                );
                Ok(audio)
            }
            Err(error) => {
                self.reporter.fail(&token, error.to_string());
                Err(error)
            }
        }
    }

    /// The stages that can fail: denylist, exchange, validation.
    async fn run_fetch(
        &self,
        url: &str,
        token: &AttemptToken,
    ) -> Result<LoadedAudio, Mp3ifyError> {
        if let Some(host) = self.blocked_host(url) {
            return Err(Mp3ifyError::UnsupportedPlatform { host });
        }

        // Advisory only; the Content-Type check below is authoritative.
        if !is_direct_audio_url(url) {
            self.reporter.set_status(
                token,
                "The link does not look like a direct audio file. Trying anyway…",
            );
        }

        log::info!("fetching {url}");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Mp3ifyError::Http {
                status: status.as_u16(),
            });
        }

        let mime = declared_content_type(&response);
        if !is_audio_mime(&mime) {
            return Err(Mp3ifyError::UnexpectedContentType { mime });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(Mp3ifyError::EmptyBody);
        }

        let display_name = filename_from_url(url, DEFAULT_DISPLAY_NAME);
        log::info!("fetched {display_name} ({mime}, {} bytes)", bytes.len());

        Ok(LoadedAudio {
            bytes: bytes.to_vec(),
            display_name,
            mime,
        })
    }

    /// Returns the matched denylist entry's host when `url` points at a
    /// blocked platform.
    fn blocked_host(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();

        self.blocked_hosts
            .iter()
            .any(|blocked| host == *blocked || host.ends_with(&format!(".{blocked}")))
            .then_some(host)
    }
}

impl Default for AudioFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the declared content type: first `;`-segment, trimmed.
fn declared_content_type(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or(value)
                .trim()
                .to_ascii_lowercase()
        })
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}
