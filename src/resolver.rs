//! Destination resolution: IATA codes pass through, free text goes to auto-complete.

use crate::{FlightError, FlightsApi};
use tracing::{debug, info, warn};

/// True for exactly three alphabetic characters, e.g. `lax`
pub fn looks_like_airport_code(input: &str) -> bool {
    input.chars().count() == 3 && input.chars().all(char::is_alphabetic)
}

/// Resolve user input to something the search endpoints accept.
///
/// The first auto-complete suggestion is taken as-is. The API offers no way
/// to disambiguate, so "Springfield" resolves to whichever Springfield the
/// API ranks first.
pub async fn resolve_destination<A>(api: &A, input: &str) -> Result<String, FlightError>
where
    A: FlightsApi + ?Sized,
{
    let input = input.trim();
    if input.is_empty() {
        return Err(FlightError::UnresolvedDestination(input.to_string()));
    }

    if looks_like_airport_code(input) {
        debug!(code = %input, "Destination is an airport code, skipping lookup");
        return Ok(input.to_uppercase());
    }

    info!(query = %input, "Resolving destination");
    let suggestions = api.auto_complete(input).await?;

    match suggestions.first().and_then(|s| s.identifier()) {
        Some(place_id) => {
            info!(query = %input, place_id = %place_id, "Destination resolved");
            Ok(place_id.to_string())
        }
        None => {
            warn!(query = %input, suggestions = suggestions.len(), "Destination could not be resolved");
            Err(FlightError::UnresolvedDestination(input.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_airport_code_detection() {
        assert!(looks_like_airport_code("LAX"));
        assert!(looks_like_airport_code("yqg"));
        assert!(!looks_like_airport_code("LA"));
        assert!(!looks_like_airport_code("LAXX"));
        assert!(!looks_like_airport_code("L4X"));
        assert!(!looks_like_airport_code("New York"));
    }
}
