use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    /// Идентификатор во внешнем каталоге (imdbID) - он же ключ для цены.
    pub external_id: String,
    pub title: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub genres: Vec<String>,
    pub runtime_minutes: i32,
    pub release_date: Option<NaiveDate>,
    pub rating: Option<f32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMovie {
    pub external_id: String,
    pub title: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub genres: Vec<String>,
    pub runtime_minutes: i32,
    pub release_date: Option<NaiveDate>,
    pub rating: Option<f32>,
}

impl NewMovie {
    pub fn into_movie(self, id: Uuid, created_at: DateTime<Utc>) -> Movie {
        Movie {
            id,
            external_id: self.external_id,
            title: self.title,
            poster_url: self.poster_url,
            backdrop_url: self.backdrop_url,
            genres: self.genres,
            runtime_minutes: self.runtime_minutes,
            release_date: self.release_date,
            rating: self.rating,
            created_at,
        }
    }
}

/// Копия карточки фильма, которая хранится вместе с избранным.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSnapshot {
    pub external_id: String,
    pub title: String,
    pub poster_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub runtime_minutes: i32,
    pub rating: Option<f32>,
}

impl From<&Movie> for MovieSnapshot {
    fn from(movie: &Movie) -> Self {
        Self {
            external_id: movie.external_id.clone(),
            title: movie.title.clone(),
            poster_url: movie.poster_url.clone(),
            genres: movie.genres.clone(),
            runtime_minutes: movie.runtime_minutes,
            rating: movie.rating,
        }
    }
}
