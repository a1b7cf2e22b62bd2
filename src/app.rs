//! Scan orchestration: reference data, feed acquisition and the route
//! evaluation loop.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    domain::{
        aggregate_routes, capacity_envelope, evaluate, meets_threshold, postings_for_route,
        select_assignments, sort_by_pay, AircraftListing, AircraftSpec, AirportIndex,
        AssignmentResult, Fleet, JobPosting, Legs,
    },
    infra::{
        cache::{load_snapshot, save_snapshot, snapshot_path, FeedSnapshot, SnapshotError},
        fse::{FeedError, FseClient, Transport},
        reference::{load_aircraft, load_airports, ReferenceDataError},
    },
    util::config::ScanConfig,
};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("reference data: {0}")]
    Reference(#[from] ReferenceDataError),
    #[error("snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("feed: {0}")]
    Feed(#[from] FeedError),
}

/// Static tables every scan needs.
#[derive(Debug)]
pub struct ReferenceData {
    pub airports: AirportIndex,
    pub specs: HashMap<String, AircraftSpec>,
}

impl ReferenceData {
    pub fn load(airports_path: &Path, aircraft_path: &Path) -> Result<Self, ReferenceDataError> {
        Ok(Self {
            airports: AirportIndex::new(load_airports(airports_path)?),
            specs: load_aircraft(aircraft_path)?,
        })
    }
}

/// Listings and jobs to evaluate, with the error that cut acquisition short.
#[derive(Debug, Default)]
pub struct FeedData {
    pub listings: Vec<AircraftListing>,
    pub jobs: Vec<JobPosting>,
    pub feed_error: Option<FeedError>,
}

impl From<FeedSnapshot> for FeedData {
    fn from(snapshot: FeedSnapshot) -> Self {
        Self {
            listings: snapshot.listings,
            jobs: snapshot.jobs,
            feed_error: None,
        }
    }
}

#[derive(Debug)]
pub struct ScanOutcome {
    /// In discovery order: routes by pay, then candidates by MTOW.
    pub results: Vec<AssignmentResult>,
    /// Set when live acquisition stopped early; results cover what was fetched.
    pub feed_error: Option<FeedError>,
}

/// Knobs of the route search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchLimits {
    pub limit: usize,
    pub radius_nm: f64,
    pub min_earnings: f64,
}

impl From<&ScanConfig> for SearchLimits {
    fn from(config: &ScanConfig) -> Self {
        Self {
            limit: config.limit,
            radius_nm: config.radius_nm,
            min_earnings: config.min_earnings,
        }
    }
}

/// Run one scan against the live feed, or the saved snapshot in local mode.
pub async fn run(config: &ScanConfig) -> Result<ScanOutcome, ScanError> {
    let client = if config.local {
        None
    } else {
        Some(FseClient::new(config.credentials.clone(), &config.feed)?)
    };
    scan(config, client.as_ref()).await
}

/// Without a client the saved snapshot is read instead of the feed.
pub async fn scan<T: Transport>(
    config: &ScanConfig,
    client: Option<&FseClient<T>>,
) -> Result<ScanOutcome, ScanError> {
    let reference = ReferenceData::load(&config.airports_path, &config.aircraft_path)?;
    let snapshot_file = match &config.snapshot_path {
        Some(path) => path.clone(),
        None => snapshot_path()?,
    };

    let data = match client {
        None => FeedData::from(load_snapshot(&snapshot_file)?),
        Some(client) => {
            let data = acquire(client, &reference, &config.ignored_models).await;
            if data.feed_error.is_none() {
                let snapshot = FeedSnapshot::new(data.listings.clone(), data.jobs.clone());
                if let Err(err) = save_snapshot(&snapshot_file, &snapshot) {
                    warn!("failed to save snapshot: {err}");
                }
            }
            data
        }
    };

    let results = find_assignments(
        &reference,
        &data.listings,
        &data.jobs,
        &config.ignored_models,
        SearchLimits::from(config),
    );
    info!("[scan] {} results", results.len());

    Ok(ScanOutcome {
        results,
        feed_error: data.feed_error,
    })
}

/// Pull listings for every searchable model, then jobs departing the
/// airports those listings sit at. Stops at the first fatal feed error and
/// keeps what was fetched until then.
pub async fn acquire<T: Transport>(
    client: &FseClient<T>,
    reference: &ReferenceData,
    ignored_models: &HashSet<String>,
) -> FeedData {
    let mut data = FeedData::default();

    let models: BTreeSet<&str> = reference
        .specs
        .keys()
        .map(String::as_str)
        .filter(|model| !ignored_models.contains(*model))
        .collect();
    info!("[aircraft] searching {} models", models.len());

    for model in models {
        match client.aircraft_by_model(model).await {
            Ok(listings) => {
                let before = data.listings.len();
                data.listings.extend(
                    listings
                        .into_iter()
                        .filter(|listing| reference.airports.contains(&listing.location)),
                );
                debug!("[aircraft] {model}: {} listings", data.listings.len() - before);
            }
            Err(err) => {
                error!("[aircraft] stopped at {model}: {err}");
                data.feed_error = Some(err);
                return data;
            }
        }
    }

    let locations: Vec<String> = data
        .listings
        .iter()
        .map(|listing| listing.location.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    info!(
        "[jobs] {} listings at {} airports",
        data.listings.len(),
        locations.len()
    );

    let (jobs, failure) = client.jobs_from_partial(&locations).await;
    data.jobs = jobs;
    if let Some(err) = failure {
        error!("[jobs] stopped after {} postings: {err}", data.jobs.len());
        data.feed_error = Some(err);
    }
    data
}

/// Walk aggregated routes by pay and price the best load for each nearby
/// aircraft until `limits.limit` results are collected.
pub fn find_assignments(
    reference: &ReferenceData,
    listings: &[AircraftListing],
    jobs: &[JobPosting],
    ignored_models: &HashSet<String>,
    limits: SearchLimits,
) -> Vec<AssignmentResult> {
    let airports = &reference.airports;
    let fleet = Fleet::new(listings, &reference.specs, ignored_models);

    let mut routes = aggregate_routes(jobs);
    sort_by_pay(&mut routes);
    debug!(
        "[scan] {} aggregated routes, aircraft at {} airports",
        routes.len(),
        fleet.locations().count()
    );

    let mut results = Vec::new();
    // Cargo and passenger routes on one leg share their postings.
    let mut seen_legs: HashSet<(&str, &str)> = HashSet::new();

    'routes: for route in &routes {
        if results.len() >= limits.limit {
            break;
        }
        if !seen_legs.insert((route.from_icao.as_str(), route.to_icao.as_str())) {
            continue;
        }
        let Some(distance_nm) = airports.distance(&route.from_icao, &route.to_icao) else {
            debug!("[scan] {} -> {}: unknown airport", route.from_icao, route.to_icao);
            continue;
        };
        let candidates = fleet.candidates_near(&route.from_icao, limits.radius_nm, airports);
        if candidates.is_empty() {
            debug!("[scan] {}: no aircraft within {} nm", route.from_icao, limits.radius_nm);
            continue;
        }
        let postings = postings_for_route(route, jobs);

        for candidate in &candidates {
            if results.len() >= limits.limit {
                break 'routes;
            }
            let registration = &candidate.listing.registration;
            let envelope = match capacity_envelope(candidate.listing, candidate.spec, distance_nm) {
                Ok(envelope) => envelope,
                Err(reason) => {
                    debug!("[scan] {registration} on {} -> {}: {reason:?}", route.from_icao, route.to_icao);
                    continue;
                }
            };
            let Some(selection) = select_assignments(&postings, &envelope) else {
                debug!("[scan] {registration} on {} -> {}: no assignment fits", route.from_icao, route.to_icao);
                continue;
            };
            let Some(craft_distance_nm) =
                airports.distance(&candidate.listing.location, &route.from_icao)
            else {
                continue;
            };

            let legs = Legs {
                distance_nm,
                craft_distance_nm,
            };
            let result = evaluate(route, candidate, legs, envelope, selection);
            if !meets_threshold(&result, limits.min_earnings) {
                debug!(
                    "[scan] {registration} on {} -> {}: below threshold (dry {:.2}, wet {:.2})",
                    route.from_icao, route.to_icao, result.dry_earnings, result.wet_earnings
                );
                continue;
            }
            info!("[scan] {result}");
            results.push(result);
        }
    }
    results
}
