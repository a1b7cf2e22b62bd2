use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of named fuel tanks in the aircraft spec table.
pub const TANK_COUNT: usize = 11;

/// Tank column names in the order they appear in the aircraft spec table.
pub const TANK_NAMES: [&str; TANK_COUNT] = [
    "Ext1", "LTip", "LAux", "LMain", "Center1", "Center2", "Center3", "RMain", "RAux", "RTip",
    "RExt2",
];

/// Airport reference row. Coordinates are decimal degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub icao: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuelType {
    /// 100LL avgas, table code 0.
    Avgas,
    /// Jet-A, table code 1.
    JetA,
}

impl FuelType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Avgas),
            1 => Some(Self::JetA),
            _ => None,
        }
    }

    /// Weight of one gallon in kilograms.
    pub fn kg_per_gallon(self) -> f64 {
        match self {
            Self::Avgas => 2.72,
            Self::JetA => 3.04,
        }
    }
}

/// Static performance data for one aircraft model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AircraftSpec {
    pub model: String,
    /// Crew beyond the pilot.
    pub crew: u32,
    pub seats: u32,
    /// Cruise speed in knots.
    pub cruise_speed: f64,
    /// Fuel burn in gallons per hour.
    pub gph: f64,
    pub fuel_type: FuelType,
    pub mtow: f64,
    pub empty_weight: f64,
    pub price: f64,
    /// Tank capacities in gallons, ordered as [`TANK_NAMES`].
    pub tanks: [f64; TANK_COUNT],
    pub engines: u32,
    pub engine_price: f64,
    pub model_id: u32,
}

/// A concrete rentable aircraft as reported by the data feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AircraftListing {
    pub make_model: String,
    pub registration: String,
    /// ICAO code of the airport the aircraft is parked at.
    pub location: String,
    /// Fuel on board as a fraction of total capacity (0..=1).
    pub pct_fuel: f64,
    /// Hourly rate excluding fuel.
    pub rental_dry: f64,
    /// Hourly rate including fuel.
    pub rental_wet: f64,
    /// Maximum rental duration in seconds.
    pub rental_time: f64,
}

impl AircraftListing {
    pub fn is_rentable(&self) -> bool {
        self.rental_dry + self.rental_wet > 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    Passengers,
    Kg,
}

impl UnitType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "passengers" => Some(Self::Passengers),
            "kg" => Some(Self::Kg),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Passengers => "passengers",
            Self::Kg => "kg",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobClass {
    Ordinary,
    /// VIP jobs: taken alone, never combined with the ordinary pool.
    Exclusive,
}

impl JobClass {
    pub fn from_type_column(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("VIP") {
            Self::Exclusive
        } else {
            Self::Ordinary
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub from_icao: String,
    pub to_icao: String,
    pub class: JobClass,
    pub unit_type: UnitType,
    /// Headcount for passenger jobs, kilograms for cargo.
    pub amount: u32,
    pub pay: f64,
    #[serde(default)]
    pub commodity: Option<String>,
    #[serde(default)]
    pub pt_assignment: bool,
}

impl JobPosting {
    pub fn is_exclusive(&self) -> bool {
        self.class == JobClass::Exclusive
    }
}

/// Demand summary for one (origin, destination, unit type) triple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRoute {
    pub from_icao: String,
    pub to_icao: String,
    pub unit_type: UnitType,
    pub amount: u64,
    pub pay: f64,
    pub postings: usize,
    /// Postings flagged as personal transport.
    #[serde(default)]
    pub pt_postings: usize,
}

/// What one aircraft can carry on one route once fuel and crew are accounted for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapacityEnvelope {
    pub max_mass: u32,
    pub max_passengers: u32,
    /// Fuel the envelope was sized for, in gallons.
    pub fuel_load: f64,
    pub trip_fuel: f64,
}

/// Jobs picked for one aircraft on one route.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub postings: Vec<JobPosting>,
    pub total_pay: f64,
    pub total_mass: u32,
    pub total_passengers: u32,
    pub exclusive: bool,
}

impl Selection {
    pub fn amounts(&self) -> Vec<u32> {
        self.postings.iter().map(|posting| posting.amount).collect()
    }
}

/// A fully priced aircraft/route opportunity.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignmentResult {
    pub from_icao: String,
    pub to_icao: String,
    pub unit_type: UnitType,
    pub make_model: String,
    pub registration: String,
    pub aircraft_location: String,
    pub distance_nm: f64,
    pub craft_distance_nm: f64,
    pub envelope: CapacityEnvelope,
    pub selection: Selection,
    pub dry_rent: f64,
    pub wet_rent: f64,
    pub dry_earnings: f64,
    pub wet_earnings: f64,
    pub dry_ratio: f64,
    pub wet_ratio: f64,
}

impl fmt::Display for AssignmentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let carried = match self.unit_type {
            UnitType::Passengers => self.selection.total_passengers,
            UnitType::Kg => self.selection.total_mass,
        };
        write!(
            f,
            "{} -> {} ({:.1} nm) | {} {} @ {} (+{:.1} nm) | {} {} for ${:.0} {:?} | dry ${:.2} ({:.2}/h) wet ${:.2} ({:.2}/h)",
            self.from_icao,
            self.to_icao,
            self.distance_nm,
            self.make_model,
            self.registration,
            self.aircraft_location,
            self.craft_distance_nm,
            carried,
            self.unit_type.label(),
            self.selection.total_pay,
            self.selection.amounts(),
            self.dry_earnings,
            self.dry_ratio,
            self.wet_earnings,
            self.wet_ratio,
        )
    }
}
