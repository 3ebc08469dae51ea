//! Wire types for the Flights Sky API responses.
//!
//! Every field is defaulted so partial or unexpected payloads still decode;
//! the normalizer decides what a missing value looks like on screen.

use serde::{Deserialize, Serialize};

/// Status value the API uses while a search is still being assembled.
pub const STATUS_INCOMPLETE: &str = "incomplete";

/// Envelope returned by the search and search-incomplete endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: SearchData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub itineraries: Itineraries,
    #[serde(default)]
    pub context: SearchContext,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Itineraries {
    #[serde(default)]
    pub results: Vec<Itinerary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchContext {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl SearchResponse {
    /// Anything but an explicit "incomplete" counts as done.
    pub fn is_incomplete(&self) -> bool {
        self.data
            .context
            .status
            .as_deref()
            .map_or(false, |s| s.eq_ignore_ascii_case(STATUS_INCOMPLETE))
    }

    pub fn session_id(&self) -> Option<&str> {
        self.data
            .context
            .session_id
            .as_deref()
            .filter(|s| !s.is_empty())
    }

    pub fn into_results(self) -> Vec<Itinerary> {
        self.data.itineraries.results
    }
}

/// One priced travel option
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub legs: Vec<Leg>,
}

impl Itinerary {
    pub fn price(&self) -> Option<f64> {
        self.price.raw
    }

    pub fn stops(&self) -> usize {
        self.legs.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub raw: Option<f64>,
    #[serde(default)]
    pub formatted: Option<String>,
}

/// A single flown segment between two airports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    #[serde(default)]
    pub origin: Place,
    #[serde(default)]
    pub destination: Place,
    /// Local ISO-8601 timestamp, e.g. `2025-06-09T07:00:00`
    #[serde(default)]
    pub departure: Option<String>,
    #[serde(default)]
    pub arrival: Option<String>,
    #[serde(default)]
    pub duration_in_minutes: Option<i64>,
    #[serde(default)]
    pub carriers: Carriers,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Carriers {
    #[serde(default)]
    pub marketing: Vec<Carrier>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    #[serde(default)]
    pub name: Option<String>,
    /// Two-letter airline designator, e.g. `DL`
    #[serde(default)]
    pub alternate_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default)]
    pub flight_number: Option<String>,
    #[serde(default)]
    pub marketing_carrier: Carrier,
}

/// Envelope returned by the auto-complete endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutoCompleteResponse {
    #[serde(default)]
    pub data: Vec<PlaceSuggestion>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSuggestion {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub presentation: Option<Presentation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub suggestion_title: Option<String>,
}

impl PlaceSuggestion {
    /// Opaque place identifier for the search endpoints
    pub fn identifier(&self) -> Option<&str> {
        self.place_id
            .as_deref()
            .or_else(|| self.presentation.as_ref().and_then(|p| p.id.as_deref()))
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_complete_response() {
        let json = r#"{
            "data": {
                "context": {"status": "complete", "sessionId": "abc"},
                "itineraries": {"results": [
                    {"id": "1", "price": {"raw": 212.5, "formatted": "$213"}, "legs": [
                        {"origin": {"displayCode": "DTW"}, "destination": {"displayCode": "LAX"},
                         "departure": "2025-06-09T07:00:00", "arrival": "2025-06-09T09:10:00",
                         "carriers": {"marketing": [{"name": "Delta", "alternateId": "DL"}]},
                         "segments": [{"flightNumber": "1234", "marketingCarrier": {"alternateId": "DL"}}]}
                    ]}
                ]}
            }
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(!response.is_incomplete());
        assert_eq!(response.session_id(), Some("abc"));

        let results = response.into_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].price(), Some(212.5));
        assert_eq!(results[0].legs[0].origin.display_code.as_deref(), Some("DTW"));
        assert_eq!(results[0].legs[0].segments[0].flight_number.as_deref(), Some("1234"));
    }

    #[test]
    fn test_decode_sparse_response() {
        let response: SearchResponse = serde_json::from_str(r#"{"data": {}}"#).unwrap();
        assert!(!response.is_incomplete());
        assert!(response.session_id().is_none());
        assert!(response.into_results().is_empty());

        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_results().is_empty());
    }

    #[test]
    fn test_incomplete_status_is_case_insensitive() {
        let json = r#"{"data": {"context": {"status": "Incomplete", "sessionId": "tok"}}}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_incomplete());
    }

    #[test]
    fn test_place_suggestion_identifier() {
        let json = r#"{"data": [
            {"placeId": "LOND"},
            {"presentation": {"id": "PARI", "title": "Paris"}},
            {"placeId": ""}
        ]}"#;
        let response: AutoCompleteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data[0].identifier(), Some("LOND"));
        assert_eq!(response.data[1].identifier(), Some("PARI"));
        assert_eq!(response.data[2].identifier(), None);
    }
}
