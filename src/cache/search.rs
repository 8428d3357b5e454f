use sha2::{Digest, Sha256};
use tracing::warn;

use crate::cache::CacheService;
use crate::metadata_client::MovieSummary;

/// Ключ кеша поиска: sha256 от нормализованного запроса и страницы.
pub fn search_key(query: &str, page: u32) -> String {
    let normalized = query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hasher.update(b"|");
    hasher.update(page.to_string().as_bytes());
    format!("search:movies:{:x}", hasher.finalize())
}

impl CacheService {
    pub async fn get_cached_search(&self, query: &str, page: u32) -> Option<Vec<MovieSummary>> {
        match self.get_json(&search_key(query, page)).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Failed to read search cache: {}", e);
                None
            }
        }
    }

    pub async fn cache_search_result(&self, query: &str, page: u32, results: &[MovieSummary]) {
        let ttl = self.config.search_ttl_seconds;
        if let Err(e) = self.set_json(&search_key(query, page), results, ttl).await {
            warn!("Failed to cache search result: {}", e);
        }
    }
}
