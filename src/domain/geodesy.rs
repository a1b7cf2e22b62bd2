//! Great-circle distances and radius searches over the airport table.

use std::collections::HashMap;

use super::entities::Airport;

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const METERS_PER_NM: f64 = 1852.0;
/// One degree of latitude is roughly 69 nm; used as a cheap band filter.
const NM_PER_DEGREE_LAT: f64 = 69.0;

/// Haversine distance in nautical miles, rounded to one decimal.
/// Inputs are radians.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    // Rounding can push `a` past 1 near antipodes.
    let a = ((dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2))
        .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    round_to(EARTH_RADIUS_M * c / METERS_PER_NM, 1)
}

/// Distance between two airports given in degrees.
pub fn distance_between(from: &Airport, to: &Airport) -> f64 {
    distance(
        from.lat.to_radians(),
        from.lon.to_radians(),
        to.lat.to_radians(),
        to.lon.to_radians(),
    )
}

/// Airports strictly closer than `radius_nm` to `origin`.
///
/// A latitude band of `radius / 69` degrees rejects most of the table before
/// any trigonometry runs.
pub fn airports_within<'a>(
    origin: &Airport,
    radius_nm: f64,
    airports: &'a [Airport],
) -> Vec<&'a Airport> {
    let band = radius_nm / NM_PER_DEGREE_LAT;
    let lat_min = origin.lat - band;
    let lat_max = origin.lat + band;

    airports
        .iter()
        .filter(|airport| airport.lat > lat_min && airport.lat < lat_max)
        .filter(|airport| distance_between(origin, airport) < radius_nm)
        .collect()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Airport table keyed by ICAO code.
#[derive(Clone, Debug, Default)]
pub struct AirportIndex {
    airports: Vec<Airport>,
    by_icao: HashMap<String, usize>,
}

impl AirportIndex {
    pub fn new(airports: Vec<Airport>) -> Self {
        let by_icao = airports
            .iter()
            .enumerate()
            .map(|(idx, airport)| (airport.icao.clone(), idx))
            .collect();
        Self { airports, by_icao }
    }

    pub fn get(&self, icao: &str) -> Option<&Airport> {
        self.by_icao.get(icao).map(|&idx| &self.airports[idx])
    }

    pub fn contains(&self, icao: &str) -> bool {
        self.by_icao.contains_key(icao)
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    /// Distance between two known airports; `None` if either code is unknown.
    pub fn distance(&self, from_icao: &str, to_icao: &str) -> Option<f64> {
        Some(distance_between(self.get(from_icao)?, self.get(to_icao)?))
    }

    /// Airports within `radius_nm` of `icao`, the origin included.
    pub fn within(&self, icao: &str, radius_nm: f64) -> Vec<&Airport> {
        match self.get(icao) {
            Some(origin) => airports_within(origin, radius_nm, &self.airports),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    fn airport(icao: &str, lat: f64, lon: f64) -> Airport {
        Airport {
            icao: icao.to_string(),
            lat,
            lon,
        }
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let points: [(f64, f64); 5] = [
            (51.4700, -0.4543),
            (40.6413, -73.7781),
            (-33.9399, 151.1753),
            (0.0, 0.0),
            (64.1300, -21.9406),
        ];
        for &(lat1, lon1) in &points {
            let (a_lat, a_lon) = (lat1.to_radians(), lon1.to_radians());
            assert_eq!(distance(a_lat, a_lon, a_lat, a_lon), 0.0);
            for &(lat2, lon2) in &points {
                let (b_lat, b_lon) = (lat2.to_radians(), lon2.to_radians());
                assert_eq!(
                    distance(a_lat, a_lon, b_lat, b_lon),
                    distance(b_lat, b_lon, a_lat, a_lon)
                );
            }
        }
    }

    #[test]
    fn one_degree_of_longitude_on_the_equator_is_sixty_nm() {
        let d = distance(0.0, 0.0, 0.0, 1f64.to_radians());
        assert!((d - 60.0).abs() <= 0.1, "got {d}");
    }

    #[test]
    fn antipodes_are_half_the_circumference_apart() {
        let pairs = [
            (0.0, 0.0, 0.0, PI),
            (0.0, -PI / 2.0, 0.0, PI / 2.0),
            (FRAC_PI_2, 0.0, -FRAC_PI_2, 0.0),
            (0.3, 0.1, -0.3, 0.1 - PI),
        ];
        for (lat1, lon1, lat2, lon2) in pairs {
            let d = distance(lat1, lon1, lat2, lon2);
            assert!(d.is_finite(), "got {d}");
            assert!((d - 10807.3).abs() <= 0.2, "got {d}");
        }
    }

    #[test]
    fn radius_search_is_strict_and_uses_band() {
        let origin = airport("AAAA", 0.0, 0.0);
        let table = vec![
            origin.clone(),
            airport("NEAR", 0.0, 0.5),   // ~30 nm east
            airport("EDGE", 0.0, 1.0),   // ~60 nm east
            airport("NRTH", 2.0, 0.0),   // ~120 nm north, outside the band
            airport("FARE", 0.0, 3.0),   // inside the band, too far
        ];

        let found: Vec<&str> = airports_within(&origin, 60.0, &table)
            .into_iter()
            .map(|a| a.icao.as_str())
            .collect();
        assert_eq!(found, vec!["AAAA", "NEAR"]);

        let wider: Vec<&str> = airports_within(&origin, 60.1, &table)
            .into_iter()
            .map(|a| a.icao.as_str())
            .collect();
        assert_eq!(wider, vec!["AAAA", "NEAR", "EDGE"]);
    }

    #[test]
    fn index_lookups() {
        let index = AirportIndex::new(vec![
            airport("AAAA", 0.0, 0.0),
            airport("BBBB", 0.0, 1.0),
            airport("CCCC", 10.0, 10.0),
        ]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.distance("AAAA", "BBBB"), Some(60.0));
        assert_eq!(index.distance("AAAA", "ZZZZ"), None);
        assert_eq!(index.within("AAAA", 100.0).len(), 2);
        assert!(index.within("ZZZZ", 100.0).is_empty());
        assert!(index.contains("CCCC"));
    }
}
