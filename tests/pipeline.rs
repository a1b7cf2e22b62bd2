use std::collections::HashSet;
use std::fs;
use std::path::Path;

use fse_assignment_scanner::{
    app::{self, ScanError},
    domain::{sort_by_dry_earnings, AircraftListing, JobClass, JobPosting, UnitType},
    infra::{
        cache::{save_snapshot, FeedSnapshot},
        fse::{Credentials, FeedSettings},
    },
    util::config::ScanConfig,
};

const AIRPORTS_CSV: &str = "\
icao,lat,lon
KSEA,47.449,-122.309
KBFI,47.530,-122.302
KPAE,47.906,-122.282
KPDX,45.588,-122.597
KGEG,47.620,-117.534
";

const AIRCRAFT_CSV: &str = "\
Model,Crew,Seats,CruiseSpeed,GPH,FuelType,MTOW,EmptyWeight,Price,Ext1,LTip,LAux,LMain,Center1,Center2,Center3,RMain,RAux,RTip,RExt2,Engines,EnginePrice,ModelId,
Cessna 208 Caravan,0,14,186,58,1,3629,2145,1850000,0,0,0,167,0,0,0,167,0,0,0,1,0,24,
Beechcraft 1900D,2,21,280,120,1,7765,4815,4500000,0,0,0,334,0,0,0,334,0,0,0,2,0,31,
Cessna 172 Skyhawk,0,4,120,10,0,1111,767,300000,0,0,0,28,0,0,0,28,0,0,0,1,0,5,
";

fn listing(model: &str, registration: &str, location: &str, dry: f64, wet: f64) -> AircraftListing {
    AircraftListing {
        make_model: model.to_string(),
        registration: registration.to_string(),
        location: location.to_string(),
        pct_fuel: 0.5,
        rental_dry: dry,
        rental_wet: wet,
        rental_time: 10.0 * 3600.0,
    }
}

fn job(to: &str, class: JobClass, unit_type: UnitType, amount: u32, pay: f64) -> JobPosting {
    JobPosting {
        from_icao: "KSEA".to_string(),
        to_icao: to.to_string(),
        class,
        unit_type,
        amount,
        pay,
        commodity: None,
        pt_assignment: false,
    }
}

fn config(dir: &Path) -> ScanConfig {
    let airports_path = dir.join("icaodata.csv");
    let aircraft_path = dir.join("aircraft.csv");
    fs::write(&airports_path, AIRPORTS_CSV).unwrap();
    fs::write(&aircraft_path, AIRCRAFT_CSV).unwrap();
    ScanConfig {
        credentials: Credentials::UserKey("user".to_string()),
        limit: 20,
        radius_nm: 50.0,
        min_earnings: 1000.0,
        local: true,
        debug: false,
        ignored_models: HashSet::new(),
        airports_path,
        aircraft_path,
        snapshot_path: Some(dir.join("feed_snapshot.json")),
        feed: FeedSettings::default(),
    }
}

#[tokio::test]
async fn local_scan_prices_routes_from_the_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let snapshot = FeedSnapshot::new(
        vec![
            listing("Cessna 208 Caravan", "N208FS", "KBFI", 300.0, 420.0),
            listing("Beechcraft 1900D", "N190BE", "KPAE", 900.0, 1300.0),
            // Not rentable: no rates.
            listing("Beechcraft 1900D", "N190XX", "KSEA", 0.0, 0.0),
            // Over 300 nm away from the origin.
            listing("Cessna 208 Caravan", "N208GG", "KGEG", 300.0, 420.0),
        ],
        vec![
            job("KPDX", JobClass::Ordinary, UnitType::Passengers, 12, 4200.0),
            job("KPDX", JobClass::Ordinary, UnitType::Kg, 600, 1800.0),
            job("KGEG", JobClass::Ordinary, UnitType::Passengers, 2, 300.0),
        ],
    );
    save_snapshot(config.snapshot_path.as_deref().unwrap(), &snapshot).unwrap();

    let mut outcome = app::run(&config).await.unwrap();
    sort_by_dry_earnings(&mut outcome.results);

    assert!(outcome.feed_error.is_none());
    assert!(!outcome.results.is_empty());
    for result in &outcome.results {
        assert_eq!(result.from_icao, "KSEA");
        assert_eq!(result.to_icao, "KPDX");
        assert_ne!(result.registration, "N190XX");
        assert_ne!(result.registration, "N208GG");
        assert!(result.selection.total_mass <= result.envelope.max_mass);
        assert!(result.selection.total_passengers <= result.envelope.max_passengers);
        assert!(result.dry_earnings >= 1000.0 || result.wet_earnings >= 1000.0);
    }
    let dry: Vec<f64> = outcome.results.iter().map(|r| r.dry_earnings).collect();
    assert!(dry.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn ignored_models_never_become_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.ignored_models = ["Cessna 208 Caravan".to_string()].into();
    let snapshot = FeedSnapshot::new(
        vec![listing("Cessna 208 Caravan", "N208FS", "KBFI", 300.0, 420.0)],
        vec![job("KPDX", JobClass::Ordinary, UnitType::Passengers, 6, 4200.0)],
    );
    save_snapshot(config.snapshot_path.as_deref().unwrap(), &snapshot).unwrap();

    let outcome = app::run(&config).await.unwrap();

    assert!(outcome.results.is_empty());
}

#[tokio::test]
async fn broken_reference_table_aborts_the_scan() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    fs::write(&config.aircraft_path, "Model,Crew\nCessna 172,0\n").unwrap();

    let err = app::run(&config).await.unwrap_err();

    assert!(matches!(err, ScanError::Reference(_)), "{err}");
}
