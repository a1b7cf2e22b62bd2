//! Route-level demand: postings grouped by origin, destination and unit type.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::entities::{AggregatedRoute, JobPosting, UnitType};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RouteKey<'a> {
    from: &'a str,
    to: &'a str,
    unit: UnitType,
}

/// Sum amount and pay per (origin, destination, unit type).
///
/// Output order is unspecified; use [`sort_by_pay`] for a priority order.
pub fn aggregate_routes(postings: &[JobPosting]) -> Vec<AggregatedRoute> {
    let mut groups: HashMap<RouteKey<'_>, AggregatedRoute> = HashMap::new();

    for posting in postings {
        let key = RouteKey {
            from: &posting.from_icao,
            to: &posting.to_icao,
            unit: posting.unit_type,
        };
        let entry = groups.entry(key).or_insert_with(|| AggregatedRoute {
            from_icao: posting.from_icao.clone(),
            to_icao: posting.to_icao.clone(),
            unit_type: posting.unit_type,
            amount: 0,
            pay: 0.0,
            postings: 0,
            pt_postings: 0,
        });
        entry.amount += u64::from(posting.amount);
        entry.pay += posting.pay;
        entry.postings += 1;
        if posting.pt_assignment {
            entry.pt_postings += 1;
        }
    }

    groups.into_values().collect()
}

/// Highest summed pay first. Ties fall back to the route key so the order is stable.
pub fn sort_by_pay(routes: &mut [AggregatedRoute]) {
    routes.sort_by(|a, b| {
        b.pay
            .partial_cmp(&a.pay)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.from_icao.cmp(&b.from_icao))
            .then_with(|| a.to_icao.cmp(&b.to_icao))
            .then_with(|| a.unit_type.cmp(&b.unit_type))
    });
}

/// Postings flying `route`'s origin and destination, any unit type.
///
/// Passenger and cargo postings on the same leg share one aircraft, so the
/// optimizer sees both.
pub fn postings_for_route<'a>(
    route: &AggregatedRoute,
    postings: &'a [JobPosting],
) -> Vec<&'a JobPosting> {
    postings
        .iter()
        .filter(|posting| posting.from_icao == route.from_icao && posting.to_icao == route.to_icao)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::JobClass;

    fn posting(from: &str, to: &str, unit: UnitType, amount: u32, pay: f64) -> JobPosting {
        JobPosting {
            from_icao: from.to_string(),
            to_icao: to.to_string(),
            class: JobClass::Ordinary,
            unit_type: unit,
            amount,
            pay,
            commodity: None,
            pt_assignment: false,
        }
    }

    #[test]
    fn groups_by_route_and_unit_type() {
        let postings = vec![
            posting("KSEA", "KPDX", UnitType::Passengers, 3, 900.0),
            posting("KSEA", "KPDX", UnitType::Passengers, 2, 500.0),
            posting("KSEA", "KPDX", UnitType::Kg, 400, 700.0),
            posting("KPDX", "KSEA", UnitType::Passengers, 1, 200.0),
        ];

        let mut routes = aggregate_routes(&postings);
        sort_by_pay(&mut routes);

        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0].from_icao, "KSEA");
        assert_eq!(routes[0].unit_type, UnitType::Passengers);
        assert_eq!(routes[0].amount, 5);
        assert_eq!(routes[0].pay, 1400.0);
        assert_eq!(routes[0].postings, 2);
        assert_eq!(routes[1].unit_type, UnitType::Kg);
        assert_eq!(routes[2].from_icao, "KPDX");
    }

    #[test]
    fn counts_personal_transport_postings() {
        let mut pt = posting("KSEA", "KPDX", UnitType::Passengers, 1, 150.0);
        pt.pt_assignment = true;
        let postings = vec![
            pt.clone(),
            pt,
            posting("KSEA", "KPDX", UnitType::Passengers, 2, 400.0),
        ];

        let routes = aggregate_routes(&postings);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].postings, 3);
        assert_eq!(routes[0].pt_postings, 2);
    }

    #[test]
    fn empty_input_yields_no_routes() {
        assert!(aggregate_routes(&[]).is_empty());
    }

    #[test]
    fn route_postings_cover_both_unit_types() {
        let postings = vec![
            posting("KSEA", "KPDX", UnitType::Passengers, 3, 900.0),
            posting("KSEA", "KPDX", UnitType::Kg, 400, 700.0),
            posting("KSEA", "KBFI", UnitType::Kg, 100, 100.0),
        ];
        let routes = aggregate_routes(&postings);
        let route = routes
            .iter()
            .find(|route| route.to_icao == "KPDX" && route.unit_type == UnitType::Kg)
            .unwrap();
        assert_eq!(postings_for_route(route, &postings).len(), 2);
    }
}
