//! Spotify Web API client
//!
//! Blocking client used as the metadata fallback for seeds missing from the
//! local catalog. Authenticates with the client-credentials flow; the id and
//! secret come from the environment (`SPOTIFY_CLIENT_ID`,
//! `SPOTIFY_CLIENT_SECRET`) and are never compiled in.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::lookup::{AudioAnalysis, MetadataLookup, TrackSummary};
use crate::{Result, SongspaceError};

pub const CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";

const API_BASE_URL: &str = "https://api.spotify.com/v1";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const USER_AGENT: &str = concat!("songspace/", env!("CARGO_PKG_VERSION"));
const INITIAL_BACKOFF_MS: u64 = 250;
const MAX_BACKOFF_MS: u64 = 4000;
// refresh a little before the advertised expiry
const TOKEN_SLACK_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
    /// Extra attempts after the first for 429 / 5xx / transport failures.
    pub max_retries: u32,
    pub api_base: String,
    pub token_url: String,
}

impl SpotifyConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout: Duration::from_secs(15),
            max_retries: 2,
            api_base: API_BASE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let id = std::env::var(CLIENT_ID_ENV)
            .map_err(|_| SongspaceError::Invalid(format!("{} is not set", CLIENT_ID_ENV)))?;
        let secret = std::env::var(CLIENT_SECRET_ENV)
            .map_err(|_| SongspaceError::Invalid(format!("{} is not set", CLIENT_SECRET_ENV)))?;
        Ok(Self::new(id, secret))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: SearchPage,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: String,
    explicit: bool,
    duration_ms: f64,
    popularity: f64,
}

/// Raw audio-features payload. The service sends `null` for tracks it has
/// not analysed, so every field is optional here and checked afterwards.
#[derive(Debug, Default, Deserialize)]
struct RawAudioFeatures {
    valence: Option<f64>,
    acousticness: Option<f64>,
    danceability: Option<f64>,
    energy: Option<f64>,
    instrumentalness: Option<f64>,
    key: Option<f64>,
    liveness: Option<f64>,
    loudness: Option<f64>,
    mode: Option<f64>,
    speechiness: Option<f64>,
    tempo: Option<f64>,
}

impl RawAudioFeatures {
    fn into_analysis(self, track_id: &str) -> Result<AudioAnalysis> {
        let missing = |field: &str| {
            SongspaceError::ExternalService(format!(
                "audio features for {} missing '{}'",
                track_id, field
            ))
        };
        Ok(AudioAnalysis {
            valence: self.valence.ok_or_else(|| missing("valence"))?,
            acousticness: self.acousticness.ok_or_else(|| missing("acousticness"))?,
            danceability: self.danceability.ok_or_else(|| missing("danceability"))?,
            energy: self.energy.ok_or_else(|| missing("energy"))?,
            instrumentalness: self
                .instrumentalness
                .ok_or_else(|| missing("instrumentalness"))?,
            key: self.key.ok_or_else(|| missing("key"))?,
            liveness: self.liveness.ok_or_else(|| missing("liveness"))?,
            loudness: self.loudness.ok_or_else(|| missing("loudness"))?,
            mode: self.mode.ok_or_else(|| missing("mode"))?,
            speechiness: self.speechiness.ok_or_else(|| missing("speechiness"))?,
            tempo: self.tempo.ok_or_else(|| missing("tempo"))?,
        })
    }
}

pub struct SpotifyClient {
    http: Client,
    config: SpotifyConfig,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SongspaceError::ExternalService(e.to_string()))?;
        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SpotifyConfig::from_env()?)
    }

    fn access_token(&self) -> Result<String> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| SongspaceError::Other("token cache poisoned".into()))?;
        if let Some(tok) = guard.as_ref() {
            if Instant::now() < tok.expires_at {
                return Ok(tok.value.clone());
            }
        }
        log::debug!("requesting Spotify access token");
        let resp = self.send(|| {
            self.http
                .post(&self.config.token_url)
                .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
                .form(&[("grant_type", "client_credentials")])
        })?;
        let body: TokenResponse = resp
            .json()
            .map_err(|e| SongspaceError::ExternalService(format!("token response: {}", e)))?;
        let ttl = body.expires_in.saturating_sub(TOKEN_SLACK_SECS);
        let value = body.access_token;
        *guard = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + Duration::from_secs(ttl),
        });
        Ok(value)
    }

    /// Sends a request, retrying rate limits, server errors and transport
    /// failures with exponential backoff.
    fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let retries_left = attempt <= self.config.max_retries;
            match build().send() {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) if retries_left && is_retryable(resp.status()) => {
                    let wait = retry_after(&resp).unwrap_or(Duration::from_millis(backoff_ms));
                    log::warn!(
                        "Spotify returned {} (attempt {}), retrying in {:?}",
                        resp.status(),
                        attempt,
                        wait
                    );
                    std::thread::sleep(wait);
                }
                Ok(resp) => {
                    let status = resp.status();
                    let text = resp.text().unwrap_or_default();
                    return Err(SongspaceError::ExternalService(format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        text
                    )));
                }
                Err(e) if retries_left => {
                    log::warn!("Spotify request failed (attempt {}): {}", attempt, e);
                    std::thread::sleep(Duration::from_millis(backoff_ms));
                }
                Err(e) => return Err(SongspaceError::ExternalService(e.to_string())),
            }
            backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_after(resp: &Response) -> Option<Duration> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs.min(MAX_BACKOFF_MS / 1000)))
}

fn search_query(name: &str, year: i32) -> String {
    format!("track:{} year:{}", name, year)
}

impl MetadataLookup for SpotifyClient {
    fn search_track(&self, name: &str, year: i32) -> Result<Option<TrackSummary>> {
        let token = self.access_token()?;
        let url = format!("{}/search", self.config.api_base);
        let q = search_query(name, year);
        log::debug!("Spotify search: {}", q);
        let resp = self.send(|| {
            self.http
                .get(&url)
                .bearer_auth(&token)
                .query(&[("q", q.as_str()), ("type", "track"), ("limit", "1")])
        })?;
        let page: SearchResponse = resp
            .json()
            .map_err(|e| SongspaceError::ExternalService(format!("search response: {}", e)))?;
        Ok(page.tracks.items.into_iter().next().map(|item| TrackSummary {
            id: item.id,
            explicit: item.explicit,
            duration_ms: item.duration_ms,
            popularity: item.popularity,
        }))
    }

    fn audio_features(&self, track_id: &str) -> Result<AudioAnalysis> {
        let token = self.access_token()?;
        let url = format!("{}/audio-features/{}", self.config.api_base, track_id);
        let resp = self.send(|| self.http.get(&url).bearer_auth(&token))?;
        let raw: Option<RawAudioFeatures> = resp
            .json()
            .map_err(|e| SongspaceError::ExternalService(format!("audio features: {}", e)))?;
        raw.unwrap_or_default().into_analysis(track_id)
    }

    fn service_name(&self) -> &str {
        "spotify"
    }
}
