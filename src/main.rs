//! CLI interface for sky-flights

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use sky_flights::{
    departure_airport, ApiConfig, FlightError, FlightSearch, Passengers, PriceRange, RegionEntry, RegionScanner,
    RegionTable, ResultRow, SearchRequest, SkyClient, TripType, DEPARTURE_AIRPORTS,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Trip length used for round trips when neither a return date nor a length is given
const DEFAULT_TRIP_LENGTH_DAYS: u32 = 7;

#[derive(Parser)]
#[command(name = "sky-flights")]
#[command(about = "Find flights with the Flights Sky API")]
#[command(version)]
pub struct Cli {
    /// JSON region table to use instead of the bundled one
    #[arg(long, global = true)]
    pub regions_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search flights to one destination
    Search {
        /// Destination airport code or city
        #[arg(short, long)]
        to: String,
        #[command(flatten)]
        trip: TripArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Find the cheapest destinations across a region
    Scan {
        /// Region name from the region table
        #[arg(short, long)]
        region: String,
        /// Limit the scan to these countries (repeatable)
        #[arg(short, long = "country")]
        countries: Vec<String>,
        #[command(flatten)]
        trip: TripArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List regions, countries and airports
    Regions,
}

#[derive(Args, Debug, Clone)]
pub struct TripArgs {
    /// Departure airport (DTW, YQG or YYZ)
    #[arg(short, long, default_value = "DTW")]
    pub from: String,
    /// Trip type (one-way, round-trip)
    #[arg(long, default_value = "one-way")]
    pub trip_type: String,
    /// Departure date (YYYY-MM-DD), defaults to tomorrow
    #[arg(short, long)]
    pub date: Option<String>,
    /// Return date for round trips (YYYY-MM-DD)
    #[arg(long, conflicts_with = "trip_length")]
    pub return_date: Option<String>,
    /// Trip length in days for round trips
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=30))]
    pub trip_length: Option<u32>,
    /// Number of adults
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u32).range(1..=6))]
    pub adults: u32,
    /// Number of children
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(0..=4))]
    pub children: u32,
    /// Minimum price, blank or 0 for no bound
    #[arg(long, default_value = "")]
    pub min_price: String,
    /// Maximum price, blank or 0 for no bound
    #[arg(long, default_value = "")]
    pub max_price: String,
    /// Currency code for prices
    #[arg(long, default_value = "USD")]
    pub currency: String,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Print results as JSON instead of a table
    #[arg(long)]
    pub json: bool,
    /// Output file for JSON results
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, FlightError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| FlightError::InvalidInput {
        field,
        message: format!("'{}' is not a YYYY-MM-DD date", raw),
    })
}

/// Turn the form fields into a validated request
fn build_request(trip: &TripArgs, destination: &str) -> Result<SearchRequest, FlightError> {
    let origin = departure_airport(&trip.from).ok_or_else(|| FlightError::InvalidInput {
        field: "from",
        message: format!(
            "{} is not a departure airport, choose one of {}",
            trip.from,
            DEPARTURE_AIRPORTS
                .iter()
                .map(|(label, code)| format!("{} ({})", label, code))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })?;

    let depart_date = match &trip.date {
        Some(raw) => parse_date("date", raw)?,
        None => Local::now().date_naive() + chrono::Duration::days(1),
    };

    let mut request = SearchRequest::one_way(origin, destination, depart_date);
    request.passengers = Passengers {
        adults: trip.adults,
        children: trip.children,
    };
    request.price = PriceRange::parse(&trip.min_price, &trip.max_price)?;
    request.currency = trip.currency.trim().to_uppercase();

    // An explicit return date or length implies a round trip
    let trip_type = if trip.return_date.is_some() || trip.trip_length.is_some() {
        TripType::RoundTrip
    } else {
        trip.trip_type.parse::<TripType>()?
    };

    if trip_type == TripType::RoundTrip {
        request = match &trip.return_date {
            Some(raw) => {
                let mut request = request;
                request.trip_type = TripType::RoundTrip;
                request.return_date = Some(parse_date("return date", raw)?);
                request
            }
            None => request.with_trip_length(trip.trip_length.unwrap_or(DEFAULT_TRIP_LENGTH_DAYS))?,
        };
    }

    request.validate()?;
    Ok(request)
}

fn load_regions(path: Option<&PathBuf>) -> Result<RegionTable, FlightError> {
    match path {
        Some(path) => RegionTable::from_path(path),
        None => RegionTable::bundled(),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sky_flights=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn render_table(rows: &[ResultRow]) -> String {
    let headers = ["From", "To", "Depart", "Arrive", "Stops", "Airline", "Flights", "Price"];
    let cells: Vec<[String; 8]> = rows
        .iter()
        .map(|row| {
            [
                row.from.clone(),
                row.to.clone(),
                row.depart.clone(),
                row.arrive.clone(),
                row.stop_summary.clone(),
                row.airline.clone(),
                row.flight_numbers.clone(),
                row.price.map(|p| format!("{:.2}", p)).unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |values: Vec<&str>| {
        values
            .iter()
            .zip(widths.iter())
            .map(|(value, width)| format!("{:<width$}", value, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![format_line(headers.to_vec())];
    for line in &cells {
        out.push(format_line(line.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

fn emit(rows: &[ResultRow], output: &OutputArgs) -> Result<()> {
    if let Some(path) = &output.output {
        let json = serde_json::to_string_pretty(rows)?;
        fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?;
        println!("Results saved to {}", path.display());
    }

    if rows.is_empty() {
        println!("No flights found.");
        return Ok(());
    }

    if output.json {
        println!("{}", serde_json::to_string_pretty(rows)?);
    } else {
        println!("Found {} options", rows.len());
        println!("{}", render_table(rows));
    }
    Ok(())
}

fn report(e: FlightError) -> ! {
    match e {
        FlightError::UnresolvedDestination(_) => eprintln!("🚫 Could not resolve destination."),
        FlightError::InvalidInput { field, message } => eprintln!("Invalid {}: {}", field, message),
        other => eprintln!("Error searching for flights: {}", other),
    }
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { to, trip, output } => {
            let request = build_request(&trip, &to).unwrap_or_else(|e| report(e));
            let client = SkyClient::new(ApiConfig::from_env()?)?;

            println!("Searching...");
            match FlightSearch::new(&client).run(&request).await {
                Ok(rows) => emit(&rows, &output)?,
                Err(e) => report(e),
            }
        }
        Commands::Scan {
            region,
            countries,
            trip,
            output,
        } => {
            let table = load_regions(cli.regions_file.as_ref())?;
            let request = build_request(&trip, "").unwrap_or_else(|e| report(e));
            let client = SkyClient::new(ApiConfig::from_env()?)?;

            println!("Scanning {}...", region);
            match RegionScanner::new(&client, &table).scan(&request, &region, &countries).await {
                Ok(rows) => emit(&rows, &output)?,
                Err(e) => report(e),
            }
        }
        Commands::Regions => {
            let table = load_regions(cli.regions_file.as_ref())?;
            for (name, entry) in table.iter() {
                println!("{}", name);
                match entry {
                    RegionEntry::Airports(codes) => println!("  {}", codes.join(", ")),
                    RegionEntry::Countries(countries) => {
                        for (country, codes) in countries {
                            println!("  {}: {}", country, codes.join(", "));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip_args(args: &[&str]) -> TripArgs {
        let mut argv = vec!["sky-flights", "search", "--to", "LAX"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Search { trip, .. } => trip,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "sky-flights",
            "search",
            "--from", "YYZ",
            "--to", "Paris",
            "--date", "2025-06-09",
        ]);

        assert!(cli.is_ok());

        if let Ok(Cli { command: Commands::Search { to, trip, .. }, .. }) = cli {
            assert_eq!(to, "Paris");
            assert_eq!(trip.from, "YYZ");
            assert_eq!(trip.date.as_deref(), Some("2025-06-09"));
            assert_eq!(trip.adults, 2);
            assert_eq!(trip.children, 1);
        }
    }

    #[test]
    fn test_cli_rejects_out_of_range_passengers() {
        assert!(Cli::try_parse_from(["sky-flights", "search", "--to", "LAX", "--adults", "0"]).is_err());
        assert!(Cli::try_parse_from(["sky-flights", "search", "--to", "LAX", "--children", "5"]).is_err());
        assert!(Cli::try_parse_from(["sky-flights", "search", "--to", "LAX", "--trip-length", "31"]).is_err());
    }

    #[test]
    fn test_scan_parsing() {
        let cli = Cli::try_parse_from([
            "sky-flights",
            "scan",
            "--region", "Europe",
            "--country", "France",
            "--country", "Spain",
        ])
        .unwrap();
        match cli.command {
            Commands::Scan { region, countries, .. } => {
                assert_eq!(region, "Europe");
                assert_eq!(countries, vec!["France", "Spain"]);
            }
            _ => panic!("expected scan command"),
        }
    }

    #[test]
    fn test_build_round_trip_from_length() {
        let trip = trip_args(&["--date", "2025-06-09", "--trip-length", "10", "--max-price", "1500"]);
        let request = build_request(&trip, "LAX").unwrap();
        assert_eq!(request.trip_type, TripType::RoundTrip);
        assert_eq!(request.return_date, NaiveDate::from_ymd_opt(2025, 6, 19));
        assert_eq!(request.price.max, Some(1500));
        assert_eq!(request.origin, "DTW");
    }

    #[test]
    fn test_build_request_rejects_bad_fields() {
        let trip = trip_args(&["--min-price", "lots"]);
        assert!(matches!(
            build_request(&trip, "LAX"),
            Err(FlightError::InvalidInput { field: "min price", .. })
        ));

        let trip = trip_args(&["--from", "LAX"]);
        assert!(matches!(
            build_request(&trip, "LAX"),
            Err(FlightError::InvalidInput { field: "from", .. })
        ));
    }

    #[test]
    fn test_render_table() {
        let row = ResultRow {
            from: "DTW".to_string(),
            to: "LAX".to_string(),
            depart: "Monday, (June 9) 07:00 AM".to_string(),
            arrive: "Monday, (June 9) 09:10 AM".to_string(),
            stops: 0,
            layovers: Vec::new(),
            stop_summary: "Nonstop".to_string(),
            airline: "Delta".to_string(),
            flight_numbers: "DL1234".to_string(),
            price: Some(212.5),
        };
        let table = render_table(&[row]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("From"));
        assert!(lines[1].contains("DL1234"));
        assert!(lines[1].ends_with("212.50"));
    }
}
