//! Rental cost and earnings for a selected load.

use super::entities::{AggregatedRoute, AssignmentResult, CapacityEnvelope, Selection};
use super::fleet::CandidateAircraft;
use super::geodesy::round_to;

/// Routes with more personal-transport postings than this lose a cut of pay.
pub const PT_FEE_FREE_POSTINGS: usize = 6;

/// Pay left after the personal-transport fee: one percent per PT posting
/// once a route carries more than [`PT_FEE_FREE_POSTINGS`] of them.
pub fn pay_after_pt_fee(pay: f64, pt_postings: usize) -> f64 {
    if pt_postings > PT_FEE_FREE_POSTINGS {
        pay - pay * pt_postings as f64 / 100.0
    } else {
        pay
    }
}

/// Flight-hour cost of positioning to the origin and flying the leg.
pub fn rental_cost(total_distance_nm: f64, hourly_rate: f64, cruise_speed: f64) -> f64 {
    round_to(total_distance_nm * hourly_rate / cruise_speed, 2)
}

/// Pay minus rent. Zero when the aircraft is not offered at this rate.
pub fn earnings(pay: f64, rent: f64, hourly_rate: f64) -> f64 {
    if hourly_rate > 0.0 {
        round_to(pay - rent, 2)
    } else {
        0.0
    }
}

/// Earnings per flight hour.
pub fn hourly_ratio(earnings: f64, total_distance_nm: f64, cruise_speed: f64) -> f64 {
    let hours = total_distance_nm / cruise_speed;
    if hours > 0.0 {
        round_to(earnings / hours, 2)
    } else {
        0.0
    }
}

/// Distances involved in one evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Legs {
    /// Origin to destination.
    pub distance_nm: f64,
    /// Aircraft location to origin.
    pub craft_distance_nm: f64,
}

impl Legs {
    pub fn total(&self) -> f64 {
        self.distance_nm + self.craft_distance_nm
    }
}

pub fn evaluate(
    route: &AggregatedRoute,
    candidate: &CandidateAircraft<'_>,
    legs: Legs,
    envelope: CapacityEnvelope,
    selection: Selection,
) -> AssignmentResult {
    let cruise = candidate.spec.cruise_speed;
    let listing = candidate.listing;
    let total = legs.total();

    let dry_rent = rental_cost(total, listing.rental_dry, cruise);
    let wet_rent = rental_cost(total, listing.rental_wet, cruise);
    let pay = pay_after_pt_fee(selection.total_pay, route.pt_postings);
    let dry_earnings = earnings(pay, dry_rent, listing.rental_dry);
    let wet_earnings = earnings(pay, wet_rent, listing.rental_wet);

    AssignmentResult {
        from_icao: route.from_icao.clone(),
        to_icao: route.to_icao.clone(),
        unit_type: route.unit_type,
        make_model: listing.make_model.clone(),
        registration: listing.registration.clone(),
        aircraft_location: listing.location.clone(),
        distance_nm: legs.distance_nm,
        craft_distance_nm: legs.craft_distance_nm,
        envelope,
        selection,
        dry_rent,
        wet_rent,
        dry_earnings,
        wet_earnings,
        dry_ratio: hourly_ratio(dry_earnings, total, cruise),
        wet_ratio: hourly_ratio(wet_earnings, total, cruise),
    }
}

/// Worth reporting: some earnings, and at least one rate reaches `min_earnings`.
pub fn meets_threshold(result: &AssignmentResult, min_earnings: f64) -> bool {
    if result.dry_earnings + result.wet_earnings == 0.0 {
        return false;
    }
    result.dry_earnings >= min_earnings || result.wet_earnings >= min_earnings
}

/// Best dry earnings first.
pub fn sort_by_dry_earnings(results: &mut [AssignmentResult]) {
    results.sort_by(|a, b| b.dry_earnings.total_cmp(&a.dry_earnings));
}
