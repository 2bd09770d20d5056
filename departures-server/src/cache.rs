//! Caching layer for SNCF API responses.
//!
//! Station search results and departure boards are cached for a short time.
//! Typing the same prefix twice, or reselecting a station, then costs no
//! request. Journeys and reports are never cached: journeys are fetched once
//! per selection and reports are already polled on their own schedule.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::domain::{Departure, Disruption, EquipmentReport, Station, Stop};
use crate::sncf::{SncfError, TransitApi};

/// Cached search results.
type SearchEntry = Arc<Vec<Station>>;

/// Cached departure board.
type BoardEntry = Arc<Vec<Departure>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for station search results.
    pub search_ttl: Duration,

    /// TTL for departure boards. Kept short since boards carry realtime data.
    pub board_ttl: Duration,

    /// Maximum number of cached entries per cache.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl: Duration::from_secs(600),
            board_ttl: Duration::from_secs(30),
            max_capacity: 1000,
        }
    }
}

/// Normalise a search query into a cache key.
fn search_key(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Transit client with caching.
///
/// Wraps any `TransitApi` and caches search and departure responses.
pub struct CachedSncfClient {
    inner: Arc<dyn TransitApi>,

    /// Search results, keyed by normalised query.
    searches: MokaCache<String, SearchEntry>,

    /// Departure boards, keyed by stop area id.
    boards: MokaCache<String, BoardEntry>,
}

impl CachedSncfClient {
    /// Create a new cached client.
    pub fn new(inner: Arc<dyn TransitApi>, config: &CacheConfig) -> Self {
        let searches = MokaCache::builder()
            .time_to_live(config.search_ttl)
            .max_capacity(config.max_capacity)
            .build();

        let boards = MokaCache::builder()
            .time_to_live(config.board_ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            inner,
            searches,
            boards,
        }
    }

    /// Search stations, using cache if available.
    pub async fn search_stations(&self, query: &str) -> Result<Vec<Station>, SncfError> {
        let key = search_key(query);

        if let Some(cached) = self.searches.get(&key).await {
            debug!(query = %key, "search cache hit");
            return Ok(cached.as_ref().clone());
        }

        let stations = self.inner.search_stations(query).await?;
        self.searches
            .insert(key, Arc::new(stations.clone()))
            .await;

        Ok(stations)
    }

    /// Get departures, using cache if available.
    pub async fn departures(&self, stop_area_id: &str) -> Result<Vec<Departure>, SncfError> {
        if let Some(cached) = self.boards.get(stop_area_id).await {
            debug!(stop_area = stop_area_id, "board cache hit");
            return Ok(cached.as_ref().clone());
        }

        let departures = self.inner.departures(stop_area_id).await?;
        self.boards
            .insert(stop_area_id.to_string(), Arc::new(departures.clone()))
            .await;

        Ok(departures)
    }
}

impl TransitApi for CachedSncfClient {
    fn search_stations<'a>(
        &'a self,
        query: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Station>, SncfError>> {
        CachedSncfClient::search_stations(self, query).boxed()
    }

    fn departures<'a>(
        &'a self,
        stop_area_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Departure>, SncfError>> {
        CachedSncfClient::departures(self, stop_area_id).boxed()
    }

    fn journey_details<'a>(
        &'a self,
        departure: &'a Departure,
    ) -> BoxFuture<'a, Result<Vec<Stop>, SncfError>> {
        self.inner.journey_details(departure)
    }

    fn line_reports(&self) -> BoxFuture<'_, Result<Vec<Disruption>, SncfError>> {
        self.inner.line_reports()
    }

    fn equipment_reports(&self) -> BoxFuture<'_, Result<Vec<EquipmentReport>, SncfError>> {
        self.inner.equipment_reports()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::sncf::MockSncfClient;

    const PLACES: &str = r#"{"places": [{
        "id": "stop_area:SNCF:87686006",
        "name": "Paris Gare de Lyon (Paris)",
        "embedded_type": "stop_area",
        "stop_area": {"id": "stop_area:SNCF:87686006", "coord": {"lat": "48.84", "lon": "2.37"}}
    }]}"#;

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.search_ttl, Duration::from_secs(600));
        assert_eq!(config.board_ttl, Duration::from_secs(30));
        assert_eq!(config.max_capacity, 1000);
    }

    #[test]
    fn search_key_normalised() {
        assert_eq!(search_key("  Gare de LYON "), "gare de lyon");
    }

    #[tokio::test]
    async fn search_hits_cache() {
        let mock = MockSncfClient::new().with_places(PLACES).unwrap();
        let calls = mock.calls();
        let client = CachedSncfClient::new(Arc::new(mock), &CacheConfig::default());

        let first = client.search_stations("Gare de Lyon").await.unwrap();
        let second = client.search_stations("gare de lyon ").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.search.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn boards_keyed_by_station() {
        let mock = MockSncfClient::new();
        let calls = mock.calls();
        let client = CachedSncfClient::new(Arc::new(mock), &CacheConfig::default());

        client.departures("stop_area:A").await.unwrap();
        client.departures("stop_area:A").await.unwrap();
        client.departures("stop_area:B").await.unwrap();

        assert_eq!(calls.departures.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_not_cached() {
        let mock = Arc::new(MockSncfClient::new().with_places(PLACES).unwrap());
        let calls = mock.calls();
        let client = CachedSncfClient::new(mock.clone(), &CacheConfig::default());

        mock.set_failing(true);
        assert!(client.search_stations("Lyon").await.is_err());
        mock.set_failing(false);
        assert!(client.search_stations("Lyon").await.is_ok());

        assert_eq!(calls.search.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_board_is_refetched() {
        let mock = MockSncfClient::new();
        let calls = mock.calls();
        let config = CacheConfig {
            board_ttl: Duration::from_millis(50),
            ..CacheConfig::default()
        };
        let client = CachedSncfClient::new(Arc::new(mock), &config);

        client.departures("stop_area:A").await.unwrap();
        // moka keeps its own clock, so paused tokio time does not apply
        tokio::time::sleep(Duration::from_millis(200)).await;
        client.departures("stop_area:A").await.unwrap();

        assert_eq!(calls.departures.load(Ordering::SeqCst), 2);
    }
}
