//! Rentable aircraft near a route origin.

use std::collections::{HashMap, HashSet};

use super::entities::{AircraftListing, AircraftSpec};
use super::geodesy::AirportIndex;

/// A listing joined with its model spec.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateAircraft<'a> {
    pub listing: &'a AircraftListing,
    pub spec: &'a AircraftSpec,
}

/// Listings grouped by the airport they are parked at, joined with specs.
#[derive(Debug, Default)]
pub struct Fleet<'a> {
    by_location: HashMap<&'a str, Vec<CandidateAircraft<'a>>>,
}

impl<'a> Fleet<'a> {
    /// Keep rentable listings with a known, non-ignored model.
    pub fn new(
        listings: &'a [AircraftListing],
        specs: &'a HashMap<String, AircraftSpec>,
        ignored_models: &HashSet<String>,
    ) -> Self {
        let mut by_location: HashMap<&'a str, Vec<CandidateAircraft<'a>>> = HashMap::new();
        for listing in listings {
            if !listing.is_rentable() || ignored_models.contains(&listing.make_model) {
                continue;
            }
            let Some(spec) = specs.get(&listing.make_model) else {
                continue;
            };
            by_location
                .entry(listing.location.as_str())
                .or_default()
                .push(CandidateAircraft { listing, spec });
        }
        Self { by_location }
    }

    pub fn locations(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.by_location.keys().copied()
    }

    pub fn at(&self, icao: &str) -> &[CandidateAircraft<'a>] {
        self.by_location
            .get(icao)
            .map(|candidates| candidates.as_slice())
            .unwrap_or_default()
    }

    /// One candidate per airport within `radius_nm` of `origin`: the one with
    /// the most seats, heavier MTOW breaking ties. Ordered by MTOW, largest
    /// first.
    pub fn candidates_near(
        &self,
        origin: &str,
        radius_nm: f64,
        airports: &AirportIndex,
    ) -> Vec<CandidateAircraft<'a>> {
        let mut picked: Vec<CandidateAircraft<'a>> = airports
            .within(origin, radius_nm)
            .into_iter()
            .filter_map(|airport| {
                self.at(&airport.icao)
                    .iter()
                    .max_by(|a, b| {
                        a.spec
                            .seats
                            .cmp(&b.spec.seats)
                            .then(a.spec.mtow.total_cmp(&b.spec.mtow))
                    })
                    .cloned()
            })
            .collect();
        picked.sort_by(|a, b| b.spec.mtow.total_cmp(&a.spec.mtow));
        picked
    }
}
