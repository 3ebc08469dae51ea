//! HTTP client for the Flights Sky API

use crate::api::{AutoCompleteResponse, PlaceSuggestion, SearchResponse};
use crate::query::{build_auto_complete_params, Endpoint, QueryParams};
use crate::{ApiConfig, FlightError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument};

/// The calls the search pipeline makes against the remote API.
///
/// [`SkyClient`] is the HTTP implementation; tests substitute scripted ones.
#[async_trait]
pub trait FlightsApi: Send + Sync {
    /// Free-text place lookup, suggestions in API order
    async fn auto_complete(&self, query: &str) -> Result<Vec<PlaceSuggestion>, FlightError>;

    /// One GET against a search endpoint (including search-incomplete)
    async fn search(&self, endpoint: Endpoint, params: &QueryParams) -> Result<SearchResponse, FlightError>;
}

/// Main flight client for making requests to the Flights Sky API
pub struct SkyClient {
    http_client: Client,
    config: ApiConfig,
}

impl SkyClient {
    /// Create a new flight client
    pub fn new(config: ApiConfig) -> Result<Self, FlightError> {
        debug!(host = %config.host, base_url = %config.base_url, "Creating new flight client");
        let http_client = Client::builder()
            .user_agent(concat!("sky-flights/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        debug!("Flight client created successfully");
        Ok(Self { http_client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.config.base_url, endpoint.path())
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint, params: &QueryParams) -> Result<T, FlightError> {
        let url = self.url(endpoint);
        info!(url = %url, params = ?params, "Making HTTP request to flight search API");

        let start_time = std::time::Instant::now();
        let response = self
            .http_client
            .get(&url)
            .header("x-rapidapi-host", &self.config.host)
            .header("x-rapidapi-key", &self.config.api_key)
            .query(params)
            .send()
            .await?;
        let status = response.status();
        let request_duration = start_time.elapsed();

        info!(
            status = %status,
            duration_ms = request_duration.as_millis(),
            "HTTP request completed"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "HTTP request failed");
            return Err(FlightError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        debug!(body_length = body.len(), "Received JSON response");
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl FlightsApi for SkyClient {
    #[instrument(level = "info", skip(self))]
    async fn auto_complete(&self, query: &str) -> Result<Vec<PlaceSuggestion>, FlightError> {
        let response: AutoCompleteResponse = self
            .get_json(Endpoint::AutoComplete, &build_auto_complete_params(query))
            .await?;
        debug!(suggestions = response.data.len(), "Auto-complete returned");
        Ok(response.data)
    }

    #[instrument(level = "info", skip(self, endpoint, params), fields(endpoint = endpoint.path()))]
    async fn search(&self, endpoint: Endpoint, params: &QueryParams) -> Result<SearchResponse, FlightError> {
        let response: SearchResponse = self.get_json(endpoint, params).await?;
        debug!(
            status = response.data.context.status.as_deref().unwrap_or(""),
            results = response.data.itineraries.results.len(),
            "Search response decoded"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_client_creation() {
        let client = SkyClient::new(ApiConfig::new("flights.example.com", "key"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_endpoint_urls() {
        let config = ApiConfig::new("flights.example.com", "key").with_base_url("http://localhost:9000/web/flights");
        let client = SkyClient::new(config).unwrap();
        assert_eq!(
            client.url(Endpoint::SearchRoundTrip),
            "http://localhost:9000/web/flights/search-roundtrip"
        );
        assert_eq!(client.url(Endpoint::AutoComplete), "http://localhost:9000/web/flights/auto-complete");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let config = ApiConfig::new("localhost", "key").with_base_url("http://127.0.0.1:9/web/flights");
        let client = SkyClient::new(config).unwrap();
        let result = client.search(Endpoint::SearchOneWay, &Vec::new()).await;
        assert!(matches!(result, Err(FlightError::HttpError(_))));
    }
}
