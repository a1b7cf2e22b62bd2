//! Fuel and payload model: how much an aircraft can lift on a given trip.

use super::entities::{AircraftListing, AircraftSpec, CapacityEnvelope};
use super::geodesy::round_to;

/// Standard passenger (and crew member) weight in kilograms.
pub const PASSENGER_WEIGHT_KG: f64 = 77.0;

/// Fixed reserve for taxi, approach and diversion, in flight hours.
pub const RESERVE_HOURS: f64 = 1.5;

/// Why an aircraft cannot be loaded for a route.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Infeasible {
    /// Spec row has no usable cruise speed or burn rate.
    MissingPerformanceData,
    /// Trip fuel including reserve exceeds total tank capacity.
    FuelExceedsTanks { needed: f64, capacity: f64 },
    /// Flight time including reserve exceeds the rental time limit.
    RentalTimeExceeded { needed_secs: f64, available_secs: f64 },
    /// Nothing left to carry once fuel and crew are on board.
    NoPayload,
}

/// Sum of all tank capacities, in gallons.
pub fn max_fuel_capacity(spec: &AircraftSpec) -> f64 {
    spec.tanks.iter().sum()
}

pub fn fuel_weight_per_unit(spec: &AircraftSpec) -> f64 {
    spec.fuel_type.kg_per_gallon()
}

/// Gallons currently in the tanks.
pub fn current_fuel_onboard(listing: &AircraftListing, spec: &AircraftSpec) -> f64 {
    (max_fuel_capacity(spec) * listing.pct_fuel).round()
}

/// Gallons needed to fly `distance_nm`, reserve included.
pub fn estimated_fuel_for_trip(distance_nm: f64, spec: &AircraftSpec) -> f64 {
    round_to(distance_nm / spec.cruise_speed, 1) * spec.gph + spec.gph * RESERVE_HOURS
}

/// Seats left for paying passengers. Extra crew occupies the right seat.
pub fn passenger_seats(spec: &AircraftSpec) -> u32 {
    let crew_seats = if spec.crew > 0 { 2 } else { 1 };
    spec.seats.saturating_sub(crew_seats)
}

/// Kilograms available for jobs with `fuel_units` gallons on board.
/// May be negative for an overloaded configuration.
pub fn usable_payload(spec: &AircraftSpec, fuel_units: f64) -> f64 {
    (spec.mtow
        - spec.empty_weight
        - PASSENGER_WEIGHT_KG * (1 + spec.crew) as f64
        - fuel_units * fuel_weight_per_unit(spec))
    .round()
}

pub fn max_passengers(spec: &AircraftSpec, payload_kg: f64) -> u32 {
    let by_weight = (payload_kg / PASSENGER_WEIGHT_KG).floor().max(0.0) as u32;
    passenger_seats(spec).min(by_weight)
}

/// Size the load an aircraft can take on a route of `distance_nm`.
///
/// The envelope is computed for the larger of the trip fuel and the fuel
/// already on board, since the tanks are never drained before departure.
pub fn capacity_envelope(
    listing: &AircraftListing,
    spec: &AircraftSpec,
    distance_nm: f64,
) -> Result<CapacityEnvelope, Infeasible> {
    if !(spec.cruise_speed > 0.0 && spec.gph > 0.0) {
        return Err(Infeasible::MissingPerformanceData);
    }

    let capacity = max_fuel_capacity(spec);
    let trip_fuel = estimated_fuel_for_trip(distance_nm, spec);
    if trip_fuel > capacity {
        return Err(Infeasible::FuelExceedsTanks {
            needed: trip_fuel,
            capacity,
        });
    }

    let needed_secs = trip_fuel / spec.gph * 3600.0;
    if listing.rental_time < needed_secs {
        return Err(Infeasible::RentalTimeExceeded {
            needed_secs,
            available_secs: listing.rental_time,
        });
    }

    let fuel_load = trip_fuel.max(current_fuel_onboard(listing, spec));
    let payload = usable_payload(spec, fuel_load);
    if payload <= 0.0 {
        return Err(Infeasible::NoPayload);
    }

    Ok(CapacityEnvelope {
        max_mass: payload.floor() as u32,
        max_passengers: max_passengers(spec, payload),
        fuel_load,
        trip_fuel,
    })
}
