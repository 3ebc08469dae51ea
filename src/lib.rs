//! # Sky Flights Library
//!
//! A small Rust client for the Flights Sky search API. It builds search
//! queries from trip parameters, waits out the API's asynchronous
//! "incomplete" searches, and flattens itineraries into price-sorted rows.
//! A region scanner runs the same search against every airport in a region
//! and keeps the cheapest destinations.

pub mod api;
pub mod client;
pub mod config;
pub mod normalize;
pub mod query;
pub mod region;
pub mod resolver;
pub mod search;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Re-export main types for convenience
pub use api::{Itinerary, Leg, PlaceSuggestion, SearchResponse};
pub use client::{FlightsApi, SkyClient};
pub use config::{ApiConfig, PollPolicy};
pub use normalize::{cheapest, normalize, sort_rows_by_price, ResultRow};
pub use query::{Endpoint, QueryParams};
pub use region::{RegionEntry, RegionScanner, RegionTable, REGION_TOP_N};
pub use resolver::resolve_destination;
pub use search::{FlightSearch, SearchExecutor};

/// Error types for the flights library
#[derive(Error, Debug)]
pub enum FlightError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Search failed: {status} {body}")]
    ApiError { status: u16, body: String },

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Could not resolve destination: {0}")]
    UnresolvedDestination(String),

    #[error("Invalid {field}: {message}")]
    InvalidInput { field: &'static str, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Region not found: {0}")]
    RegionNotFound(String),
}

impl FlightError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        FlightError::InvalidInput {
            field,
            message: message.into(),
        }
    }
}

/// Departure airports offered by the search form, as (label, IATA code).
pub const DEPARTURE_AIRPORTS: &[(&str, &str)] = &[
    ("Detroit", "DTW"),
    ("Windsor", "YQG"),
    ("Toronto", "YYZ"),
];

/// Look up a departure airport by IATA code or label, case-insensitively.
pub fn departure_airport(input: &str) -> Option<&'static str> {
    let input = input.trim();
    DEPARTURE_AIRPORTS
        .iter()
        .find(|(label, code)| label.eq_ignore_ascii_case(input) || code.eq_ignore_ascii_case(input))
        .map(|(_, code)| *code)
}

/// Trip type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripType {
    OneWay,
    RoundTrip,
}

impl FromStr for TripType {
    type Err = FlightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "round-trip" | "roundtrip" => Ok(TripType::RoundTrip),
            "one-way" | "oneway" => Ok(TripType::OneWay),
            _ => Err(FlightError::invalid("trip type", format!("expected one-way or round-trip, got {}", s))),
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripType::OneWay => f.write_str("one-way"),
            TripType::RoundTrip => f.write_str("round-trip"),
        }
    }
}

/// Passenger limits accepted by the search form.
pub const MAX_ADULTS: u32 = 6;
pub const MAX_CHILDREN: u32 = 4;
/// Trip lengths accepted when deriving a return date.
pub const MIN_TRIP_LENGTH_DAYS: u32 = 1;
pub const MAX_TRIP_LENGTH_DAYS: u32 = 30;

/// Passenger configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passengers {
    pub adults: u32,
    pub children: u32,
}

impl Default for Passengers {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
        }
    }
}

/// Optional price bounds in whole currency units. `None` is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl PriceRange {
    /// Parse the two free-text price fields of the search form.
    ///
    /// Blank and zero both mean "no bound". Anything that is not a
    /// non-negative whole number blocks the search with a field-level error.
    pub fn parse(min: &str, max: &str) -> Result<Self, FlightError> {
        let range = Self {
            min: parse_price_field("min price", min)?,
            max: parse_price_field("max price", max)?,
        };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), FlightError> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(FlightError::invalid(
                    "min price",
                    format!("{} is greater than max price {}", min, max),
                ));
            }
        }
        Ok(())
    }
}

fn parse_price_field(field: &'static str, raw: &str) -> Result<Option<u32>, FlightError> {
    let raw = raw.trim().trim_start_matches('$');
    if raw.is_empty() {
        return Ok(None);
    }
    let value = raw
        .replace(',', "")
        .parse::<u32>()
        .map_err(|_| FlightError::invalid(field, format!("'{}' is not a whole number", raw)))?;
    Ok(if value == 0 { None } else { Some(value) })
}

/// Complete flight search request with all parameters
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub origin: String,
    /// IATA code or free text, resolved before dispatch
    pub destination: String,
    pub trip_type: TripType,
    pub depart_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub passengers: Passengers,
    pub price: PriceRange,
    pub currency: String,
}

impl SearchRequest {
    /// One-way request with default passengers, no price bounds and USD pricing.
    pub fn one_way(origin: &str, destination: &str, depart_date: NaiveDate) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            trip_type: TripType::OneWay,
            depart_date,
            return_date: None,
            passengers: Passengers::default(),
            price: PriceRange::default(),
            currency: "USD".to_string(),
        }
    }

    /// Turn this into a round trip returning `days` after departure.
    pub fn with_trip_length(mut self, days: u32) -> Result<Self, FlightError> {
        if !(MIN_TRIP_LENGTH_DAYS..=MAX_TRIP_LENGTH_DAYS).contains(&days) {
            return Err(FlightError::invalid(
                "trip length",
                format!(
                    "{} days is outside {}-{}",
                    days, MIN_TRIP_LENGTH_DAYS, MAX_TRIP_LENGTH_DAYS
                ),
            ));
        }
        let return_date = self
            .depart_date
            .checked_add_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| FlightError::invalid("trip length", format!("{} days overflows the calendar", days)))?;
        self.trip_type = TripType::RoundTrip;
        self.return_date = Some(return_date);
        Ok(self)
    }

    /// Same trip, different destination. Used by the region scanner.
    pub fn to_destination(&self, destination: &str) -> Self {
        Self {
            destination: destination.to_string(),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), FlightError> {
        if self.origin.trim().is_empty() {
            return Err(FlightError::invalid("origin", "departure airport is required"));
        }
        if self.passengers.adults == 0 {
            return Err(FlightError::invalid("adults", "at least one adult is required"));
        }
        if self.passengers.adults > MAX_ADULTS {
            return Err(FlightError::invalid(
                "adults",
                format!("{} is more than {}", self.passengers.adults, MAX_ADULTS),
            ));
        }
        if self.passengers.children > MAX_CHILDREN {
            return Err(FlightError::invalid(
                "children",
                format!("{} is more than {}", self.passengers.children, MAX_CHILDREN),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(FlightError::invalid("currency", "currency is required"));
        }
        match (self.trip_type, self.return_date) {
            (TripType::RoundTrip, None) => {
                return Err(FlightError::invalid("return date", "round trips need a return date"));
            }
            (TripType::RoundTrip, Some(ret)) if ret < self.depart_date => {
                return Err(FlightError::invalid(
                    "return date",
                    format!("{} is before departure {}", ret, self.depart_date),
                ));
            }
            _ => {}
        }
        self.price.validate()
    }
}

/// Main public API function: resolve, search, poll and normalize in one call.
///
/// Reads credentials from the environment (see [`ApiConfig::from_env`]).
pub async fn search_flights(request: SearchRequest) -> Result<Vec<ResultRow>, FlightError> {
    let client = SkyClient::new(ApiConfig::from_env()?)?;
    FlightSearch::new(&client).run(&request).await
}

/// Scan every airport of `region` (optionally narrowed to `countries`) using
/// the bundled region table and return the cheapest destinations.
pub async fn scan_region(
    template: SearchRequest,
    region: &str,
    countries: &[String],
) -> Result<Vec<ResultRow>, FlightError> {
    let client = SkyClient::new(ApiConfig::from_env()?)?;
    let table = RegionTable::bundled()?;
    RegionScanner::new(&client, &table)
        .scan(&template, region, countries)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_trip_type_parsing() {
        assert!(matches!("round-trip".parse::<TripType>(), Ok(TripType::RoundTrip)));
        assert!(matches!("Round-trip".parse::<TripType>(), Ok(TripType::RoundTrip)));
        assert!(matches!("one-way".parse::<TripType>(), Ok(TripType::OneWay)));
        assert!(matches!("oneway".parse::<TripType>(), Ok(TripType::OneWay)));
        assert!("multi-city".parse::<TripType>().is_err());
    }

    #[test]
    fn test_passengers_default() {
        let passengers = Passengers::default();
        assert_eq!(passengers.adults, 1);
        assert_eq!(passengers.children, 0);
    }

    #[test]
    fn test_price_range_blank_and_zero_are_unbounded() {
        let range = PriceRange::parse("", "0").unwrap();
        assert_eq!(range, PriceRange { min: None, max: None });

        let range = PriceRange::parse(" 100 ", "$1,500").unwrap();
        assert_eq!(range.min, Some(100));
        assert_eq!(range.max, Some(1500));
    }

    #[test]
    fn test_price_range_rejects_malformed_input() {
        match PriceRange::parse("cheap", "") {
            Err(FlightError::InvalidInput { field, .. }) => assert_eq!(field, "min price"),
            other => panic!("expected min price error, got {:?}", other),
        }
        match PriceRange::parse("", "-5") {
            Err(FlightError::InvalidInput { field, .. }) => assert_eq!(field, "max price"),
            other => panic!("expected max price error, got {:?}", other),
        }
        assert!(PriceRange::parse("900", "100").is_err());
    }

    #[test]
    fn test_trip_length_sets_return_date() {
        let request = SearchRequest::one_way("DTW", "LAX", date("2025-06-09")).with_trip_length(7).unwrap();
        assert_eq!(request.trip_type, TripType::RoundTrip);
        assert_eq!(request.return_date, Some(date("2025-06-16")));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_trip_length_out_of_range() {
        for days in [0, 31, u32::MAX] {
            match SearchRequest::one_way("DTW", "LAX", date("2025-06-09")).with_trip_length(days) {
                Err(FlightError::InvalidInput { field, .. }) => assert_eq!(field, "trip length"),
                other => panic!("expected trip length error for {}, got {:?}", days, other),
            }
        }
    }

    #[test]
    fn test_trip_length_past_calendar_end() {
        let result = SearchRequest::one_way("DTW", "LAX", NaiveDate::MAX).with_trip_length(1);
        assert!(matches!(result, Err(FlightError::InvalidInput { field: "trip length", .. })));
    }

    #[test]
    fn test_request_validation() {
        let mut request = SearchRequest::one_way("DTW", "LAX", date("2025-06-09"));
        assert!(request.validate().is_ok());

        request.passengers.adults = 0;
        assert!(request.validate().is_err());
        request.passengers.adults = 7;
        assert!(matches!(
            request.validate(),
            Err(FlightError::InvalidInput { field: "adults", .. })
        ));
        request.passengers.adults = 2;
        request.passengers.children = 5;
        assert!(matches!(
            request.validate(),
            Err(FlightError::InvalidInput { field: "children", .. })
        ));
        request.passengers.children = 4;
        assert!(request.validate().is_ok());

        request.trip_type = TripType::RoundTrip;
        assert!(request.validate().is_err());

        request.return_date = Some(date("2025-06-01"));
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_departure_airport_lookup() {
        assert_eq!(departure_airport("dtw"), Some("DTW"));
        assert_eq!(departure_airport("Toronto"), Some("YYZ"));
        assert_eq!(departure_airport("LAX"), None);
    }
}
