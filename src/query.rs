//! Query parameter building for the Flights Sky endpoints

use crate::{SearchRequest, TripType};

/// Ordered query string pairs as sent on the wire
pub type QueryParams = Vec<(&'static str, String)>;

/// Endpoints consumed under the API base URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    AutoComplete,
    SearchOneWay,
    SearchRoundTrip,
    SearchIncomplete,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::AutoComplete => "auto-complete",
            Endpoint::SearchOneWay => "search-one-way",
            Endpoint::SearchRoundTrip => "search-roundtrip",
            Endpoint::SearchIncomplete => "search-incomplete",
        }
    }

    pub fn for_trip(trip_type: TripType) -> Self {
        match trip_type {
            TripType::OneWay => Endpoint::SearchOneWay,
            TripType::RoundTrip => Endpoint::SearchRoundTrip,
        }
    }
}

/// Build the search query for `request` between two already-resolved place ids.
///
/// `returnDate` is only sent for round trips, and price bounds only when set.
pub fn build_search_params(request: &SearchRequest, place_from: &str, place_to: &str) -> QueryParams {
    let mut params: QueryParams = vec![
        ("placeIdFrom", place_from.to_string()),
        ("placeIdTo", place_to.to_string()),
        ("departDate", request.depart_date.format("%Y-%m-%d").to_string()),
        ("adults", request.passengers.adults.to_string()),
        ("children", request.passengers.children.to_string()),
        ("currency", request.currency.clone()),
    ];

    if let (TripType::RoundTrip, Some(return_date)) = (request.trip_type, request.return_date) {
        params.push(("returnDate", return_date.format("%Y-%m-%d").to_string()));
    }
    if let Some(min) = request.price.min.filter(|p| *p > 0) {
        params.push(("minPrice", min.to_string()));
    }
    if let Some(max) = request.price.max.filter(|p| *p > 0) {
        params.push(("maxPrice", max.to_string()));
    }

    params
}

pub fn build_auto_complete_params(query: &str) -> QueryParams {
    vec![("q", query.to_string())]
}

pub fn build_poll_params(session_id: &str) -> QueryParams {
    vec![("sessionId", session_id.to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Passengers, PriceRange};
    use chrono::NaiveDate;

    fn get<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_one_way_params() {
        let mut request = SearchRequest::one_way("DTW", "LAX", NaiveDate::from_ymd_opt(2025, 6, 9).unwrap());
        request.passengers = Passengers { adults: 2, children: 1 };

        let params = build_search_params(&request, "DTW", "LAX");
        assert_eq!(get(&params, "placeIdFrom"), Some("DTW"));
        assert_eq!(get(&params, "placeIdTo"), Some("LAX"));
        assert_eq!(get(&params, "departDate"), Some("2025-06-09"));
        assert_eq!(get(&params, "adults"), Some("2"));
        assert_eq!(get(&params, "children"), Some("1"));
        assert_eq!(get(&params, "currency"), Some("USD"));
        assert_eq!(get(&params, "returnDate"), None);
        assert_eq!(get(&params, "minPrice"), None);
        assert_eq!(get(&params, "maxPrice"), None);
    }

    #[test]
    fn test_round_trip_with_price_bounds() {
        let mut request =
            SearchRequest::one_way("YYZ", "CUN", NaiveDate::from_ymd_opt(2025, 12, 20).unwrap()).with_trip_length(14).unwrap();
        request.price = PriceRange { min: Some(200), max: Some(1500) };

        let params = build_search_params(&request, "YYZ", "CUN");
        assert_eq!(get(&params, "returnDate"), Some("2026-01-03"));
        assert_eq!(get(&params, "minPrice"), Some("200"));
        assert_eq!(get(&params, "maxPrice"), Some("1500"));
    }

    #[test]
    fn test_endpoint_selection() {
        assert_eq!(Endpoint::for_trip(TripType::OneWay).path(), "search-one-way");
        assert_eq!(Endpoint::for_trip(TripType::RoundTrip).path(), "search-roundtrip");
        assert_eq!(Endpoint::SearchIncomplete.path(), "search-incomplete");
        assert_eq!(build_poll_params("tok"), vec![("sessionId", "tok".to_string())]);
        assert_eq!(build_auto_complete_params("Paris"), vec![("q", "Paris".to_string())]);
    }
}
