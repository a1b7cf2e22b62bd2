//! Domain logic for assignment scanning lives here.

pub mod aggregation;
pub mod entities;
pub mod evaluation;
pub mod fleet;
pub mod geodesy;
pub mod optimizer;
pub mod performance;

pub use aggregation::{aggregate_routes, postings_for_route, sort_by_pay};
pub use entities::{
    AggregatedRoute, AircraftListing, AircraftSpec, Airport, AssignmentResult, CapacityEnvelope,
    FuelType, JobClass, JobPosting, Selection, UnitType, TANK_COUNT, TANK_NAMES,
};
pub use evaluation::{evaluate, meets_threshold, sort_by_dry_earnings, Legs};
pub use fleet::{CandidateAircraft, Fleet};
pub use geodesy::{airports_within, distance, distance_between, AirportIndex};
pub use optimizer::{select_assignments, SolverError};
pub use performance::{capacity_envelope, Infeasible, PASSENGER_WEIGHT_KG};
