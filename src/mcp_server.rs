// src/mcp_server.rs

use anyhow::Result;
use chrono::NaiveDate;
use rmcp::{
    model::{ServerCapabilities, ServerInfo},
    schemars, tool,
    transport::stdio,
    ServerHandler, ServiceExt,
};
use serde::Deserialize;
use sky_flights::config::ENV_REGIONS_FILE;
use sky_flights::{
    departure_airport, ApiConfig, FlightError, FlightSearch, Passengers, PriceRange, RegionScanner, RegionTable,
    ResultRow, SearchRequest, SkyClient, TripType,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Flight search MCP server
#[derive(Clone)]
pub struct FlightServer {
    client: Arc<SkyClient>,
    regions: Arc<RegionTable>,
}

impl FlightServer {
    pub fn new(client: SkyClient, regions: RegionTable) -> Self {
        Self {
            client: Arc::new(client),
            regions: Arc::new(regions),
        }
    }

    /// Initialize logging to file
    fn init_logging() -> Result<()> {
        let log_dir = PathBuf::from("logs");
        std::fs::create_dir_all(&log_dir)?;

        // stdout carries the protocol, so logs go to a daily file
        let file_appender = tracing_appender::rolling::daily(&log_dir, "sky-flights-mcp.log");

        tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info"))
                    .add_directive("sky_flights=debug".parse()?),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .init();

        info!("Logging initialized - logs will be written to logs/sky-flights-mcp.log.*");
        Ok(())
    }
}

/// Trip parameters shared by both search tools
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct FlightSearchParams {
    #[schemars(description = "Departure airport: DTW, YQG or YYZ")]
    pub from_airport: String,
    #[schemars(description = "Destination IATA code (e.g. LAX) or free-text city name (e.g. Paris)")]
    pub destination: String,
    #[schemars(description = "Departure date in YYYY-MM-DD format")]
    pub departure_date: String,
    #[schemars(description = "Return date in YYYY-MM-DD format for round trips")]
    pub return_date: Option<String>,
    #[schemars(description = "Trip length in days for round trips, used when no return date is given")]
    pub trip_length_days: Option<u32>,
    #[schemars(description = "Trip type: one-way or round-trip")]
    pub trip_type: Option<String>,
    #[schemars(description = "Number of adult passengers (default 1)")]
    pub adults: Option<u32>,
    #[schemars(description = "Number of child passengers (default 0)")]
    pub children: Option<u32>,
    #[schemars(description = "Minimum price, blank or 0 for no bound")]
    pub min_price: Option<String>,
    #[schemars(description = "Maximum price, blank or 0 for no bound")]
    pub max_price: Option<String>,
    #[schemars(description = "Currency code (default USD)")]
    pub currency: Option<String>,
    #[schemars(description = "Maximum number of flights to return (default: 30)")]
    pub max_flights: Option<usize>,
}

#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct RegionScanParams {
    #[schemars(description = "Departure airport: DTW, YQG or YYZ")]
    pub from_airport: String,
    #[schemars(description = "Region name, see list_regions")]
    pub region: String,
    #[schemars(description = "Optional countries within the region to limit the scan to")]
    pub countries: Option<Vec<String>>,
    #[schemars(description = "Departure date in YYYY-MM-DD format")]
    pub departure_date: String,
    #[schemars(description = "Return date in YYYY-MM-DD format for round trips")]
    pub return_date: Option<String>,
    #[schemars(description = "Trip length in days for round trips, used when no return date is given")]
    pub trip_length_days: Option<u32>,
    #[schemars(description = "Trip type: one-way or round-trip")]
    pub trip_type: Option<String>,
    #[schemars(description = "Number of adult passengers (default 1)")]
    pub adults: Option<u32>,
    #[schemars(description = "Number of child passengers (default 0)")]
    pub children: Option<u32>,
    #[schemars(description = "Minimum price, blank or 0 for no bound")]
    pub min_price: Option<String>,
    #[schemars(description = "Maximum price, blank or 0 for no bound")]
    pub max_price: Option<String>,
    #[schemars(description = "Currency code (default USD)")]
    pub currency: Option<String>,
}

#[tool(tool_box)]
impl FlightServer {
    /// Search one destination
    #[tool(description = "Search flights from a departure airport to a destination airport code or city name. Returns itineraries sorted by price.")]
    async fn search_flights(&self, #[tool(aggr)] params: FlightSearchParams) -> String {
        info!(
            from_airport = %params.from_airport,
            destination = %params.destination,
            departure_date = %params.departure_date,
            return_date = params.return_date.as_deref(),
            trip_type = params.trip_type.as_deref().unwrap_or("one-way"),
            "Flight search request received"
        );

        let request = match build_search_request(&params) {
            Ok(request) => request,
            Err(e) => {
                warn!("Invalid search parameters: {}", e);
                return error_json(&e);
            }
        };

        match FlightSearch::new(self.client.as_ref()).run(&request).await {
            Ok(rows) => {
                info!(flights_found = rows.len(), "Flight search completed successfully");
                format_rows_json(rows, params.max_flights.unwrap_or(30))
            }
            Err(e) => {
                error!("Flight search failed: {}", e);
                error_json(&e)
            }
        }
    }

    /// Cheapest destinations in a region
    #[tool(description = "Find the 10 cheapest destinations in a region (optionally limited to some countries). Returns one cheapest itinerary per destination, sorted by price.")]
    async fn scan_region(&self, #[tool(aggr)] params: RegionScanParams) -> String {
        info!(
            from_airport = %params.from_airport,
            region = %params.region,
            countries = ?params.countries,
            departure_date = %params.departure_date,
            "Region scan request received"
        );

        let request = match build_scan_request(&params) {
            Ok(request) => request,
            Err(e) => {
                warn!("Invalid scan parameters: {}", e);
                return error_json(&e);
            }
        };

        let countries = params.countries.clone().unwrap_or_default();
        match RegionScanner::new(self.client.as_ref(), self.regions.as_ref())
            .scan(&request, &params.region, &countries)
            .await
        {
            Ok(rows) => {
                info!(destinations = rows.len(), "Region scan completed successfully");
                format_rows_json(rows, usize::MAX)
            }
            Err(e) => {
                error!("Region scan failed: {}", e);
                error_json(&e)
            }
        }
    }

    /// Region table contents
    #[tool(description = "List the regions, countries and airport codes available to scan_region.")]
    async fn list_regions(&self) -> String {
        debug!("Listing regions");
        serde_json::to_string_pretty(self.regions.as_ref())
            .unwrap_or_else(|e| serde_json::json!({ "error": format!("Failed to serialize regions: {}", e) }).to_string())
    }
}

fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, FlightError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| FlightError::InvalidInput {
        field,
        message: format!("'{}' is not a YYYY-MM-DD date", raw),
    })
}

fn base_request(
    from_airport: &str,
    destination: &str,
    departure_date: &str,
    trip_type: Option<&str>,
    return_date: Option<&str>,
    trip_length_days: Option<u32>,
) -> Result<SearchRequest, FlightError> {
    let origin = departure_airport(from_airport).ok_or_else(|| FlightError::InvalidInput {
        field: "from_airport",
        message: format!("{} is not a supported departure airport", from_airport),
    })?;

    let mut request = SearchRequest::one_way(origin, destination, parse_date("departure_date", departure_date)?);

    let trip_type = match trip_type {
        Some(raw) => raw.parse::<TripType>()?,
        None if return_date.is_some() || trip_length_days.is_some() => TripType::RoundTrip,
        None => TripType::OneWay,
    };

    if trip_type == TripType::RoundTrip {
        request = match (return_date, trip_length_days) {
            (Some(raw), _) => {
                request.trip_type = TripType::RoundTrip;
                request.return_date = Some(parse_date("return_date", raw)?);
                request
            }
            (None, Some(days)) => request.with_trip_length(days)?,
            (None, None) => {
                return Err(FlightError::InvalidInput {
                    field: "return_date",
                    message: "round trips need return_date or trip_length_days".to_string(),
                })
            }
        };
    }

    Ok(request)
}

fn build_search_request(params: &FlightSearchParams) -> Result<SearchRequest, FlightError> {
    let mut request = base_request(
        &params.from_airport,
        &params.destination,
        &params.departure_date,
        params.trip_type.as_deref(),
        params.return_date.as_deref(),
        params.trip_length_days,
    )?;
    request.passengers = Passengers {
        adults: params.adults.unwrap_or(1),
        children: params.children.unwrap_or(0),
    };
    request.price = PriceRange::parse(
        params.min_price.as_deref().unwrap_or(""),
        params.max_price.as_deref().unwrap_or(""),
    )?;
    if let Some(currency) = &params.currency {
        request.currency = currency.trim().to_uppercase();
    }
    request.validate()?;
    Ok(request)
}

fn build_scan_request(params: &RegionScanParams) -> Result<SearchRequest, FlightError> {
    let mut request = base_request(
        &params.from_airport,
        "",
        &params.departure_date,
        params.trip_type.as_deref(),
        params.return_date.as_deref(),
        params.trip_length_days,
    )?;
    request.passengers = Passengers {
        adults: params.adults.unwrap_or(1),
        children: params.children.unwrap_or(0),
    };
    request.price = PriceRange::parse(
        params.min_price.as_deref().unwrap_or(""),
        params.max_price.as_deref().unwrap_or(""),
    )?;
    if let Some(currency) = &params.currency {
        request.currency = currency.trim().to_uppercase();
    }
    request.validate()?;
    Ok(request)
}

fn error_json(e: &FlightError) -> String {
    serde_json::json!({ "error": e.to_string() }).to_string()
}

fn format_rows_json(rows: Vec<ResultRow>, max_flights: usize) -> String {
    if rows.is_empty() {
        return serde_json::json!({
            "total_flights": 0,
            "flights": [],
            "message": "No flights found."
        })
        .to_string();
    }

    let total_flights = rows.len();
    let flights: Vec<ResultRow> = rows.into_iter().take(max_flights).collect();

    serde_json::to_string_pretty(&serde_json::json!({
        "total_flights": total_flights,
        "flights": flights,
    }))
    .unwrap_or_else(|e| serde_json::json!({ "error": format!("Failed to serialize results: {}", e) }).to_string())
}

#[tool(tool_box)]
impl ServerHandler for FlightServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("A flight search server backed by the Flights Sky API. search_flights returns price-sorted itineraries for one destination; scan_region returns the cheapest destinations across a region.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = FlightServer::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("Starting MCP Flight Server");

    let client = SkyClient::new(ApiConfig::from_env()?)?;
    let regions = match std::env::var(ENV_REGIONS_FILE) {
        Ok(path) if !path.trim().is_empty() => RegionTable::from_path(path.trim())?,
        _ => RegionTable::bundled()?,
    };

    let server = FlightServer::new(client, regions);
    let transport = stdio();

    let service = server.serve(transport).await?;
    info!("MCP service started, waiting for requests");

    service.waiting().await?;

    info!("MCP service shutting down");
    Ok(())
}
