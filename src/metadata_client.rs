//! Клиент внешнего каталога фильмов (OMDb-совместимый API).
//!
//! Ответы API разбираются на границе в типизированные записи
//! [`MovieSummary`] и [`MovieDetails`]; дальше по коду строки `"N/A"` не
//! протекают. Сетевые вызовы идут через [`CircuitBreaker`].

use chrono::NaiveDate;
use reqwest::StatusCode;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{CircuitBreakerConfig, MetadataConfig};
use crate::models::{MovieSnapshot, NewMovie};
use crate::services::circuit_breaker::{CircuitBreaker, CircuitError, CircuitState};

pub const POSTER_PLACEHOLDER: &str = "https://via.placeholder.com/300x450?text=No+Poster";
pub const BACKDROP_PLACEHOLDER: &str = "https://via.placeholder.com/1920x1080?text=No+Backdrop";

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Error)]
pub enum MetadataError {
    /// Цепь разомкнута или сервис не ответил.
    #[error("metadata service unavailable: {0}")]
    Unavailable(String),

    #[error("movie {0} not found")]
    NotFound(String),

    /// Сервис ответил, но отказал (ключ, лимит запросов и т.п.).
    #[error("metadata service rejected request: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub external_id: String,
    pub title: String,
    pub year: String,
    pub poster_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalRating {
    pub source: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub external_id: String,
    pub title: String,
    pub year: String,
    pub poster_url: String,
    pub backdrop_url: String,
    pub genres: Vec<String>,
    pub runtime_minutes: i32,
    pub release_date: Option<NaiveDate>,
    pub rating: Option<f32>,
    pub plot: Option<String>,
    pub director: Option<String>,
    pub writer: Option<String>,
    pub actors: Vec<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub ratings: Vec<ExternalRating>,
}

impl MovieDetails {
    /// Карточка без подробностей - когда запрос деталей не удался.
    pub fn from_summary(summary: MovieSummary) -> Self {
        Self {
            external_id: summary.external_id,
            title: summary.title,
            year: summary.year,
            backdrop_url: BACKDROP_PLACEHOLDER.to_string(),
            poster_url: summary.poster_url,
            genres: Vec::new(),
            runtime_minutes: 0,
            release_date: None,
            rating: None,
            plot: None,
            director: None,
            writer: None,
            actors: Vec::new(),
            language: None,
            country: None,
            ratings: Vec::new(),
        }
    }

    pub fn to_new_movie(&self) -> NewMovie {
        NewMovie {
            external_id: self.external_id.clone(),
            title: self.title.clone(),
            poster_url: Some(self.poster_url.clone()),
            backdrop_url: Some(self.backdrop_url.clone()),
            genres: self.genres.clone(),
            runtime_minutes: self.runtime_minutes,
            release_date: self.release_date,
            rating: self.rating,
        }
    }

    pub fn snapshot(&self) -> MovieSnapshot {
        MovieSnapshot {
            external_id: self.external_id.clone(),
            title: self.title.clone(),
            poster_url: Some(self.poster_url.clone()),
            genres: self.genres.clone(),
            runtime_minutes: self.runtime_minutes,
            rating: self.rating,
        }
    }
}

// --- Сырые ответы API ---

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Search", default)]
    search: Vec<RawSummary>,
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSummary {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDetails {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "imdbID", default)]
    imdb_id: Option<String>,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "Released", default)]
    released: Option<String>,
    #[serde(rename = "Runtime", default)]
    runtime: Option<String>,
    #[serde(rename = "Genre", default)]
    genre: Option<String>,
    #[serde(rename = "Director", default)]
    director: Option<String>,
    #[serde(rename = "Writer", default)]
    writer: Option<String>,
    #[serde(rename = "Actors", default)]
    actors: Option<String>,
    #[serde(rename = "Plot", default)]
    plot: Option<String>,
    #[serde(rename = "Language", default)]
    language: Option<String>,
    #[serde(rename = "Country", default)]
    country: Option<String>,
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
    #[serde(rename = "Ratings", default)]
    ratings: Vec<RawRating>,
}

/// Тело ответа с ошибкой при статусе не 2xx.
#[derive(Debug, Deserialize)]
struct ApiFailure {
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRating {
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Value")]
    value: String,
}

// --- Разбор полей ---

/// `None` для пустых значений и `"N/A"`.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != NOT_AVAILABLE)
}

pub fn parse_poster(value: Option<String>) -> String {
    present(value).unwrap_or_else(|| POSTER_PLACEHOLDER.to_string())
}

/// `"148 min"` -> 148; без ведущих цифр - 0.
pub fn parse_runtime(value: &str) -> i32 {
    let digits: String = value.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

pub fn parse_genres(value: &str) -> Vec<String> {
    if value.trim() == NOT_AVAILABLE {
        return Vec::new();
    }
    value
        .split(',')
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}

pub fn parse_rating(value: &str) -> Option<f32> {
    value.trim().parse().ok()
}

/// Дата выхода в формате `"01 Mar 2024"`.
pub fn parse_release_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%d %b %Y").ok()
}

fn split_list(value: Option<String>) -> Vec<String> {
    present(value).map(|v| parse_genres(&v)).unwrap_or_default()
}

fn is_not_found(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("not found") || message.contains("incorrect imdb id")
}

fn is_empty_search(message: &str) -> bool {
    is_not_found(message) || message.to_ascii_lowercase().contains("too many results")
}

impl From<RawSummary> for MovieSummary {
    fn from(raw: RawSummary) -> Self {
        Self {
            external_id: raw.imdb_id,
            title: raw.title,
            year: present(raw.year).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            poster_url: parse_poster(raw.poster),
        }
    }
}

impl RawDetails {
    fn into_details(self, requested_id: &str) -> MovieDetails {
        let poster = present(self.poster);
        MovieDetails {
            external_id: present(self.imdb_id).unwrap_or_else(|| requested_id.to_string()),
            title: present(self.title).unwrap_or_default(),
            year: present(self.year).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            backdrop_url: poster.clone().unwrap_or_else(|| BACKDROP_PLACEHOLDER.to_string()),
            poster_url: poster.unwrap_or_else(|| POSTER_PLACEHOLDER.to_string()),
            genres: split_list(self.genre),
            runtime_minutes: self.runtime.as_deref().map(parse_runtime).unwrap_or(0),
            release_date: self.released.as_deref().and_then(parse_release_date),
            rating: self.imdb_rating.as_deref().and_then(parse_rating),
            plot: present(self.plot),
            director: present(self.director),
            writer: present(self.writer),
            actors: split_list(self.actors),
            language: present(self.language),
            country: present(self.country),
            ratings: self
                .ratings
                .into_iter()
                .map(|r| ExternalRating {
                    source: r.source,
                    value: r.value,
                })
                .collect(),
        }
    }
}

// --- Клиент ---

#[derive(Debug)]
enum CallError {
    Transport(reqwest::Error),
    Status(StatusCode, Option<String>),
}

impl CallError {
    fn is_outage(&self) -> bool {
        match self {
            CallError::Transport(_) => true,
            CallError::Status(status, _) => status.is_server_error(),
        }
    }
}

pub struct MetadataClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    circuit_breaker: CircuitBreaker,
}

impl MetadataClient {
    pub fn from_config(
        config: &MetadataConfig,
        breaker: &CircuitBreakerConfig,
    ) -> Result<Self, MetadataError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MetadataError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            circuit_breaker: CircuitBreaker::new(
                breaker.failure_threshold,
                Duration::from_secs(breaker.timeout_seconds),
            ),
        })
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Один запрос к API. Ошибка reqwest хранится без URL: в нём ключ API.
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, CallError> {
        let response = self
            .http_client
            .get(format!("{}/", self.base_url))
            .query(&[("apikey", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| CallError::Transport(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            // OMDb отвечает 401 на плохой ключ, но тело то же: {"Response":"False","Error":...}
            let message = response
                .json::<ApiFailure>()
                .await
                .ok()
                .and_then(|body| present(body.error));
            return Err(CallError::Status(status, message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CallError::Transport(e.without_url()))
    }

    /// GET к API через выключатель. Сбоем считаются только сеть и 5xx.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, MetadataError> {
        match self
            .circuit_breaker
            .call_with(CallError::is_outage, self.send(params))
            .await
        {
            Ok(body) => Ok(body),
            Err(CircuitError::Rejected) => {
                warn!("Circuit breaker is OPEN - blocking metadata request");
                Err(MetadataError::Unavailable("circuit breaker is open".to_string()))
            }
            Err(CircuitError::Inner(CallError::Status(status, message)))
                if status.is_client_error() =>
            {
                let message = message.unwrap_or_else(|| status.to_string());
                warn!("Metadata request rejected ({}): {}", status, message);
                Err(MetadataError::Rejected(message))
            }
            Err(CircuitError::Inner(CallError::Status(status, _))) => {
                error!("Metadata service answered {}", status);
                Err(MetadataError::Unavailable(format!("metadata service answered {status}")))
            }
            Err(CircuitError::Inner(CallError::Transport(e))) => {
                error!("Metadata request failed: {}", e);
                Err(MetadataError::Unavailable(e.to_string()))
            }
        }
    }

    /// Поиск фильмов по строке. "Ничего не найдено" - пустой список.
    pub async fn search(&self, query: &str, page: u32) -> Result<Vec<MovieSummary>, MetadataError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let page = page.max(1).to_string();

        info!("Searching metadata: query={:?}, page={}", query, page);
        let response: SearchResponse = match self
            .get(&[("s", query), ("type", "movie"), ("page", page.as_str())])
            .await
        {
            Err(MetadataError::Rejected(message)) if is_empty_search(&message) => {
                return Ok(Vec::new())
            }
            other => other?,
        };

        if response.response != "True" {
            let message = response.error.unwrap_or_default();
            if is_empty_search(&message) {
                return Ok(Vec::new());
            }
            return Err(MetadataError::Rejected(message));
        }

        Ok(response.search.into_iter().map(MovieSummary::from).collect())
    }

    /// Полная карточка фильма по внешнему id.
    pub async fn fetch(&self, external_id: &str) -> Result<MovieDetails, MetadataError> {
        let raw: RawDetails = match self.get(&[("i", external_id), ("plot", "full")]).await {
            Err(MetadataError::Rejected(message)) if is_not_found(&message) => {
                return Err(MetadataError::NotFound(external_id.to_string()))
            }
            other => other?,
        };

        if raw.response != "True" {
            let message = raw.error.unwrap_or_default();
            if is_not_found(&message) {
                return Err(MetadataError::NotFound(external_id.to_string()));
            }
            return Err(MetadataError::Rejected(message));
        }

        Ok(raw.into_details(external_id))
    }

    /// Поиск с подробностями: детали запрашиваются параллельно, при
    /// неудаче остаётся карточка из поиска.
    pub async fn search_detailed(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Vec<MovieDetails>, MetadataError> {
        let summaries = self.search(query, page).await?;
        let details = join_all(summaries.iter().map(|s| self.fetch(&s.external_id))).await;

        Ok(summaries
            .into_iter()
            .zip(details)
            .map(|(summary, detail)| match detail {
                Ok(detail) => detail,
                Err(e) => {
                    warn!("Falling back to summary for {}: {}", summary.external_id, e);
                    MovieDetails::from_summary(summary)
                }
            })
            .collect())
    }
}
