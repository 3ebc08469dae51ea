//! Flattening itineraries into display rows

use crate::api::{Itinerary, Leg};
use chrono::{DateTime, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Display-ready projection of one itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub from: String,
    pub to: String,
    pub depart: String,
    pub arrive: String,
    pub stops: usize,
    /// One entry per stop, `2h30m` style; empty when a timestamp is missing
    pub layovers: Vec<String>,
    pub stop_summary: String,
    pub airline: String,
    pub flight_numbers: String,
    pub price: Option<f64>,
}

/// Pick the itinerary with the lowest raw price; the first one wins ties.
/// Unpriced itineraries are never selected.
pub fn cheapest(itineraries: &[Itinerary]) -> Option<&Itinerary> {
    let mut best: Option<(&Itinerary, f64)> = None;
    for itinerary in itineraries {
        let Some(price) = itinerary.price() else {
            continue;
        };
        match best {
            Some((_, best_price)) if price >= best_price => {}
            _ => best = Some((itinerary, price)),
        }
    }
    best.map(|(itinerary, _)| itinerary)
}

/// Derive a display row. Never fails; missing pieces become empty strings.
pub fn normalize(itinerary: &Itinerary) -> ResultRow {
    let legs = &itinerary.legs;
    let first = legs.first();
    let last = legs.last();

    let layovers: Vec<String> = legs
        .windows(2)
        .map(|pair| {
            layover(&pair[0], &pair[1])
                .map(format_duration)
                .unwrap_or_default()
        })
        .collect();

    ResultRow {
        from: first
            .and_then(|l| l.origin.display_code.clone())
            .unwrap_or_default(),
        to: last
            .and_then(|l| l.destination.display_code.clone())
            .unwrap_or_default(),
        depart: first
            .and_then(|l| l.departure.as_deref())
            .map(format_datetime)
            .unwrap_or_default(),
        arrive: last
            .and_then(|l| l.arrival.as_deref())
            .map(format_datetime)
            .unwrap_or_default(),
        stops: itinerary.stops(),
        stop_summary: stop_summary(&layovers),
        layovers,
        airline: airline_names(legs),
        flight_numbers: flight_numbers(legs),
        price: itinerary.price(),
    }
}

/// Ascending by price, unpriced rows last, ties keep their input order.
pub fn sort_rows_by_price(rows: &mut [ResultRow]) {
    rows.sort_by(|a, b| match (a.price, b.price) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Parse the API's timestamps. They are usually local times without an
/// offset; an RFC 3339 offset is accepted and dropped.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
}

/// `2025-06-09T07:00:00` -> `Monday, (June 9) 07:00 AM`
pub fn format_datetime(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%A, (%B %-d) %I:%M %p").to_string())
        .unwrap_or_default()
}

/// Gap between arriving on `leg` and departing on `next`
pub fn layover(leg: &Leg, next: &Leg) -> Option<Duration> {
    let arrival = parse_timestamp(leg.arrival.as_deref()?)?;
    let departure = parse_timestamp(next.departure.as_deref()?)?;
    let gap = departure - arrival;
    (gap >= Duration::zero()).then_some(gap)
}

/// Whole hours and minutes, truncated: 2h30m, 0h05m
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    format!("{}h{:02}m", minutes / 60, minutes % 60)
}

fn stop_summary(layovers: &[String]) -> String {
    match layovers.len() {
        0 => "Nonstop".to_string(),
        n => {
            let label = if n == 1 { "1 stop".to_string() } else { format!("{} stops", n) };
            let known: Vec<&str> = layovers
                .iter()
                .map(String::as_str)
                .filter(|l| !l.is_empty())
                .collect();
            if known.is_empty() {
                label
            } else {
                format!("{} ({})", label, known.join(", "))
            }
        }
    }
}

fn airline_names(legs: &[Leg]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for carrier in legs.iter().flat_map(|l| l.carriers.marketing.iter()) {
        if let Some(name) = carrier.name.as_deref().filter(|n| !n.is_empty()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names.join(", ")
}

fn flight_numbers(legs: &[Leg]) -> String {
    legs.iter()
        .flat_map(|l| l.segments.iter())
        .filter_map(|segment| {
            let number = segment.flight_number.as_deref().filter(|n| !n.is_empty())?;
            let carrier = segment.marketing_carrier.alternate_id.as_deref().unwrap_or("");
            Some(format!("{}{}", carrier, number))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
