//! Static reference tables: airports and aircraft model specs.
//!
//! Both are read once at startup. Any row that does not fit the schema aborts
//! the load.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::domain::{AircraftSpec, Airport, FuelType, TANK_COUNT, TANK_NAMES};

/// Column count of the aircraft spec table.
pub const AIRCRAFT_COLUMNS: usize = 24;

const COL_MODEL: usize = 0;
const COL_CREW: usize = 1;
const COL_SEATS: usize = 2;
const COL_CRUISE: usize = 3;
const COL_GPH: usize = 4;
const COL_FUEL_TYPE: usize = 5;
const COL_MTOW: usize = 6;
const COL_EMPTY: usize = 7;
const COL_PRICE: usize = 8;
const COL_FIRST_TANK: usize = 9;
const COL_ENGINES: usize = 20;
const COL_ENGINE_PRICE: usize = 21;
const COL_MODEL_ID: usize = 22;

#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("cannot open {file}: {source}")]
    Open {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },
    #[error("{file} row {row}: {message}")]
    Malformed {
        file: String,
        row: usize,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct AirportRow {
    icao: String,
    lat: f64,
    lon: f64,
}

pub fn load_airports(path: &Path) -> Result<Vec<Airport>, ReferenceDataError> {
    let file = open(path)?;
    let airports = read_airports(file, &path.display().to_string())?;
    info!("[reference] {} airports from {}", airports.len(), path.display());
    Ok(airports)
}

pub fn load_aircraft(path: &Path) -> Result<HashMap<String, AircraftSpec>, ReferenceDataError> {
    let file = open(path)?;
    let specs = read_aircraft(file, &path.display().to_string())?;
    info!("[reference] {} aircraft models from {}", specs.len(), path.display());
    Ok(specs
        .into_iter()
        .map(|spec| (spec.model.clone(), spec))
        .collect())
}

fn open(path: &Path) -> Result<File, ReferenceDataError> {
    File::open(path).map_err(|source| ReferenceDataError::Open {
        file: path.display().to_string(),
        source,
    })
}

/// Airports by header name; columns beyond icao/lat/lon are ignored.
pub fn read_airports<R: Read>(reader: R, file: &str) -> Result<Vec<Airport>, ReferenceDataError> {
    let mut reader = ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);
    let mut airports = Vec::new();
    for (idx, row) in reader.deserialize::<AirportRow>().enumerate() {
        let row = row.map_err(|err| ReferenceDataError::Malformed {
            file: file.to_string(),
            row: idx + 2,
            message: err.to_string(),
        })?;
        if row.icao.is_empty() || !row.lat.is_finite() || !row.lon.is_finite() {
            return Err(ReferenceDataError::Malformed {
                file: file.to_string(),
                row: idx + 2,
                message: "missing icao or coordinates".to_string(),
            });
        }
        airports.push(Airport {
            icao: row.icao,
            lat: row.lat,
            lon: row.lon,
        });
    }
    Ok(airports)
}

/// Aircraft specs by column position; the header row is skipped, not trusted.
pub fn read_aircraft<R: Read>(reader: R, file: &str) -> Result<Vec<AircraftSpec>, ReferenceDataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut specs = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|source| ReferenceDataError::Csv {
            file: file.to_string(),
            source,
        })?;
        let row = SpecRow {
            record: &record,
            file,
            row: idx + 2,
        };
        specs.push(row.parse()?);
    }
    Ok(specs)
}

struct SpecRow<'a> {
    record: &'a StringRecord,
    file: &'a str,
    row: usize,
}

impl SpecRow<'_> {
    fn malformed(&self, message: String) -> ReferenceDataError {
        ReferenceDataError::Malformed {
            file: self.file.to_string(),
            row: self.row,
            message,
        }
    }

    fn field<T: FromStr>(&self, col: usize, name: &str) -> Result<T, ReferenceDataError> {
        let raw = self.record.get(col).unwrap_or_default();
        raw.parse()
            .map_err(|_| self.malformed(format!("column {name}: cannot parse {raw:?}")))
    }

    /// Empty tank columns mean the tank does not exist.
    fn tank(&self, col: usize, name: &str) -> Result<f64, ReferenceDataError> {
        if self.record.get(col).unwrap_or_default().is_empty() {
            Ok(0.0)
        } else {
            self.field(col, name)
        }
    }

    fn parse(&self) -> Result<AircraftSpec, ReferenceDataError> {
        if self.record.len() != AIRCRAFT_COLUMNS {
            return Err(self.malformed(format!(
                "expected {AIRCRAFT_COLUMNS} columns, found {}",
                self.record.len()
            )));
        }

        let model = self.record.get(COL_MODEL).unwrap_or_default().to_string();
        if model.is_empty() {
            return Err(self.malformed("empty model name".to_string()));
        }

        let fuel_code: u8 = self.field(COL_FUEL_TYPE, "FuelType")?;
        let fuel_type = FuelType::from_code(fuel_code)
            .ok_or_else(|| self.malformed(format!("unknown fuel type code {fuel_code}")))?;

        let mut tanks = [0.0; TANK_COUNT];
        for (offset, (tank, name)) in tanks.iter_mut().zip(TANK_NAMES).enumerate() {
            *tank = self.tank(COL_FIRST_TANK + offset, name)?;
        }

        Ok(AircraftSpec {
            model,
            crew: self.field(COL_CREW, "Crew")?,
            seats: self.field(COL_SEATS, "Seats")?,
            cruise_speed: self.field(COL_CRUISE, "CruiseSpeed")?,
            gph: self.field(COL_GPH, "GPH")?,
            fuel_type,
            mtow: self.field(COL_MTOW, "MTOW")?,
            empty_weight: self.field(COL_EMPTY, "EmptyWeight")?,
            price: self.field(COL_PRICE, "Price")?,
            tanks,
            engines: self.field(COL_ENGINES, "Engines")?,
            engine_price: self.field(COL_ENGINE_PRICE, "EnginePrice")?,
            model_id: self.field(COL_MODEL_ID, "ModelId")?,
        })
    }
}
