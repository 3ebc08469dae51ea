//! Search execution: one request, then bounded polling while the API reports
//! the search as incomplete.

use crate::api::Itinerary;
use crate::normalize::{normalize, sort_rows_by_price, ResultRow};
use crate::query::{build_poll_params, build_search_params, Endpoint};
use crate::resolver::resolve_destination;
use crate::{FlightError, FlightsApi, PollPolicy, SearchRequest};
use tracing::{debug, info, instrument, warn};

/// Runs one search and waits out the "incomplete" status.
pub struct SearchExecutor<'a, A: ?Sized> {
    api: &'a A,
    policy: PollPolicy,
}

impl<'a, A> SearchExecutor<'a, A>
where
    A: FlightsApi + ?Sized,
{
    pub fn new(api: &'a A) -> Self {
        Self::with_policy(api, PollPolicy::default())
    }

    pub fn with_policy(api: &'a A, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Search between two resolved place ids.
    ///
    /// Returns the result list of the first complete response, or an empty
    /// list when the poll budget runs out. HTTP failures are returned as
    /// errors and never retried.
    #[instrument(level = "info", skip(self, request), fields(trip_type = %request.trip_type))]
    pub async fn execute(
        &self,
        request: &SearchRequest,
        place_from: &str,
        place_to: &str,
    ) -> Result<Vec<Itinerary>, FlightError> {
        let endpoint = Endpoint::for_trip(request.trip_type);
        let params = build_search_params(request, place_from, place_to);

        let mut response = self.api.search(endpoint, &params).await?;
        let mut attempt = 0;

        if !response.is_incomplete() {
            let results = response.into_results();
            info!(results = results.len(), polls = attempt, "Search completed");
            return Ok(results);
        }

        // Later replies may omit the session id; the first one must carry it.
        let Some(mut session_id) = response.session_id().map(str::to_string) else {
            warn!("Search incomplete without a session id, returning partial results");
            return Ok(response.into_results());
        };

        while response.is_incomplete() {
            if let Some(refreshed) = response.session_id() {
                if refreshed != session_id {
                    debug!(session_id = refreshed, "Search session id refreshed");
                    session_id = refreshed.to_string();
                }
            }

            if attempt >= self.policy.max_attempts {
                warn!(attempts = attempt, "Search still incomplete, poll budget exhausted");
                return Ok(Vec::new());
            }
            attempt += 1;

            debug!(attempt, max_attempts = self.policy.max_attempts, "Search incomplete, polling");
            tokio::time::sleep(self.policy.interval).await;
            response = self
                .api
                .search(Endpoint::SearchIncomplete, &build_poll_params(&session_id))
                .await?;
        }

        let results = response.into_results();
        info!(results = results.len(), polls = attempt, "Search completed");
        Ok(results)
    }
}

/// Full single-destination flow: validate, resolve, search, normalize, sort.
pub struct FlightSearch<'a, A: ?Sized> {
    api: &'a A,
    executor: SearchExecutor<'a, A>,
}

impl<'a, A> FlightSearch<'a, A>
where
    A: FlightsApi + ?Sized,
{
    pub fn new(api: &'a A) -> Self {
        Self::with_policy(api, PollPolicy::default())
    }

    pub fn with_policy(api: &'a A, policy: PollPolicy) -> Self {
        Self {
            api,
            executor: SearchExecutor::with_policy(api, policy),
        }
    }

    /// Rows sorted ascending by price. An empty list means no flights found.
    pub async fn run(&self, request: &SearchRequest) -> Result<Vec<ResultRow>, FlightError> {
        request.validate()?;

        let place_to = resolve_destination(self.api, &request.destination).await?;
        info!(
            origin = %request.origin,
            destination = %place_to,
            depart_date = %request.depart_date,
            "Searching flights"
        );

        let itineraries = self.executor.execute(request, &request.origin, &place_to).await?;
        let mut rows: Vec<ResultRow> = itineraries.iter().map(normalize).collect();
        sort_rows_by_price(&mut rows);

        info!(rows = rows.len(), "Found {} options", rows.len());
        Ok(rows)
    }
}
