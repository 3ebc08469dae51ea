//! Static region -> country -> airport tables and the region scanner

use crate::normalize::{cheapest, normalize, sort_rows_by_price, ResultRow};
use crate::{FlightError, FlightsApi, PollPolicy, SearchExecutor, SearchRequest};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// How many destinations a region scan reports
pub const REGION_TOP_N: usize = 10;

const BUNDLED_REGIONS: &str = include_str!("../data/regions.json");

/// A region is either broken down by country or a flat airport list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionEntry {
    Airports(Vec<String>),
    Countries(IndexMap<String, Vec<String>>),
}

/// Read-only lookup of IATA codes by region and country, in file order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionTable {
    regions: IndexMap<String, RegionEntry>,
}

impl RegionTable {
    /// The table shipped with the crate
    pub fn bundled() -> Result<Self, FlightError> {
        Self::from_json(BUNDLED_REGIONS)
    }

    pub fn from_json(json: &str) -> Result<Self, FlightError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FlightError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FlightError::ConfigError(format!("cannot read region table {}: {}", path.display(), e)))?;
        let table = Self::from_json(&json)?;
        info!(path = %path.display(), regions = table.regions.len(), "Loaded region table");
        Ok(table)
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegionEntry)> {
        self.regions.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    fn entry(&self, region: &str) -> Result<(&str, &RegionEntry), FlightError> {
        self.regions
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(region.trim()))
            .map(|(name, entry)| (name.as_str(), entry))
            .ok_or_else(|| FlightError::RegionNotFound(region.to_string()))
    }

    /// Country names of a region; empty for flat regions
    pub fn countries(&self, region: &str) -> Result<Vec<&str>, FlightError> {
        Ok(match self.entry(region)?.1 {
            RegionEntry::Airports(_) => Vec::new(),
            RegionEntry::Countries(countries) => countries.keys().map(String::as_str).collect(),
        })
    }

    /// Airports of `region`, narrowed to `countries` when any are given.
    ///
    /// Codes are uppercased and deduplicated, first occurrence kept.
    pub fn airports(&self, region: &str, countries: &[String]) -> Result<Vec<String>, FlightError> {
        let (region_name, entry) = self.entry(region)?;

        let codes: Vec<&String> = match entry {
            RegionEntry::Airports(codes) => {
                if !countries.is_empty() {
                    return Err(FlightError::invalid(
                        "country",
                        format!("{} has no country breakdown", region_name),
                    ));
                }
                codes.iter().collect()
            }
            RegionEntry::Countries(by_country) if countries.is_empty() => by_country.values().flatten().collect(),
            RegionEntry::Countries(by_country) => {
                let mut selected = Vec::new();
                for wanted in countries {
                    let codes = by_country
                        .iter()
                        .find(|(name, _)| name.eq_ignore_ascii_case(wanted.trim()))
                        .map(|(_, codes)| codes)
                        .ok_or_else(|| {
                            FlightError::invalid("country", format!("{} is not in {}", wanted, region_name))
                        })?;
                    selected.extend(codes.iter());
                }
                selected
            }
        };

        let mut airports: Vec<String> = Vec::with_capacity(codes.len());
        for code in codes {
            let code = code.trim().to_uppercase();
            if !code.is_empty() && !airports.contains(&code) {
                airports.push(code);
            }
        }
        Ok(airports)
    }
}

/// Searches every airport of a region and keeps the cheapest itinerary per destination
pub struct RegionScanner<'a, A: ?Sized> {
    table: &'a RegionTable,
    executor: SearchExecutor<'a, A>,
}

impl<'a, A> RegionScanner<'a, A>
where
    A: FlightsApi + ?Sized,
{
    pub fn new(api: &'a A, table: &'a RegionTable) -> Self {
        Self::with_policy(api, table, PollPolicy::default())
    }

    pub fn with_policy(api: &'a A, table: &'a RegionTable, policy: PollPolicy) -> Self {
        Self {
            table,
            executor: SearchExecutor::with_policy(api, policy),
        }
    }

    /// Top [`REGION_TOP_N`] destinations by price.
    ///
    /// Destinations are searched one after another. A destination that fails
    /// or returns nothing is left out of the result.
    pub async fn scan(
        &self,
        template: &SearchRequest,
        region: &str,
        countries: &[String],
    ) -> Result<Vec<ResultRow>, FlightError> {
        template.validate()?;
        let airports = self.table.airports(region, countries)?;
        info!(
            region = %region,
            countries = ?countries,
            destinations = airports.len(),
            "Scanning region"
        );

        let mut rows = Vec::new();
        for code in &airports {
            let request = template.to_destination(code);
            match self.executor.execute(&request, &request.origin, code).await {
                Ok(itineraries) => match cheapest(&itineraries) {
                    Some(best) => {
                        debug!(destination = %code, price = ?best.price(), "Cheapest itinerary found");
                        rows.push(normalize(best));
                    }
                    None => debug!(destination = %code, "No priced itineraries, skipping"),
                },
                Err(e) => warn!(destination = %code, error = %e, "Destination search failed, skipping"),
            }
        }

        sort_rows_by_price(&mut rows);
        rows.truncate(REGION_TOP_N);
        info!(region = %region, rows = rows.len(), "Region scan completed");
        Ok(rows)
    }
}
