//! Job selection for one aircraft on one route.
//!
//! Ordinary postings are packed with an exact two-constraint 0/1 knapsack
//! (mass and headcount), solved by depth-first branch and bound. Exclusive
//! postings are never combined with anything; the best single one competes
//! against the packed ordinary load.

use std::cmp::Ordering;

use thiserror::Error;
use tracing::{debug, warn};

use super::entities::{CapacityEnvelope, JobPosting, Selection, UnitType};
use super::performance::PASSENGER_WEIGHT_KG;

/// Search nodes explored before an instance is abandoned.
pub const DEFAULT_NODE_BUDGET: u64 = 2_000_000;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SolverError {
    #[error("search exceeded {0} nodes")]
    NodeBudgetExhausted(u64),
}

/// One knapsack item: a posting reduced to its two weights and value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item {
    pub mass: u64,
    pub passengers: u64,
    pub pay: f64,
}

impl Item {
    /// Passenger postings weigh [`PASSENGER_WEIGHT_KG`] per head and count
    /// against the seat limit; cargo only counts against mass.
    pub fn from_posting(posting: &JobPosting) -> Self {
        let amount = u64::from(posting.amount);
        match posting.unit_type {
            UnitType::Passengers => Self {
                mass: amount * PASSENGER_WEIGHT_KG as u64,
                passengers: amount,
                pay: posting.pay,
            },
            UnitType::Kg => Self {
                mass: amount,
                passengers: 0,
                pay: posting.pay,
            },
        }
    }

    fn fits(&self, mass_left: u64, passengers_left: u64) -> bool {
        self.mass <= mass_left && self.passengers <= passengers_left
    }
}

/// Pick the postings that pay the most without exceeding `envelope`.
///
/// Returns `None` when nothing fits, or when the solver gives up on this
/// instance; neither case is an error for the caller.
pub fn select_assignments(postings: &[&JobPosting], envelope: &CapacityEnvelope) -> Option<Selection> {
    select_assignments_with_budget(postings, envelope, DEFAULT_NODE_BUDGET)
}

pub fn select_assignments_with_budget(
    postings: &[&JobPosting],
    envelope: &CapacityEnvelope,
    node_budget: u64,
) -> Option<Selection> {
    let max_mass = u64::from(envelope.max_mass);
    let max_passengers = u64::from(envelope.max_passengers);

    let (exclusive, ordinary): (Vec<&JobPosting>, Vec<&JobPosting>) =
        postings.iter().copied().partition(|posting| posting.is_exclusive());

    let items: Vec<Item> = ordinary.iter().map(|posting| Item::from_posting(posting)).collect();
    let picked = match solve_knapsack(&items, max_mass, max_passengers, node_budget) {
        Ok(picked) => picked,
        Err(err) => {
            warn!(
                postings = ordinary.len(),
                max_mass, max_passengers, "knapsack abandoned: {err}"
            );
            return None;
        }
    };
    let ordinary_pay: f64 = picked.iter().map(|&idx| items[idx].pay).sum();

    let best_exclusive = exclusive
        .iter()
        .copied()
        .filter(|posting| Item::from_posting(posting).fits(max_mass, max_passengers))
        .max_by(|a, b| a.pay.partial_cmp(&b.pay).unwrap_or(Ordering::Equal));

    match best_exclusive {
        Some(vip) if picked.is_empty() || vip.pay >= ordinary_pay => {
            debug!(pay = vip.pay, ordinary_pay, "exclusive posting wins");
            Some(build_selection(vec![vip], true))
        }
        _ if picked.is_empty() => None,
        _ => Some(build_selection(
            picked.iter().map(|&idx| ordinary[idx]).collect(),
            false,
        )),
    }
}

fn build_selection(postings: Vec<&JobPosting>, exclusive: bool) -> Selection {
    let (total_mass, total_passengers, total_pay) =
        postings
            .iter()
            .fold((0u64, 0u64, 0.0), |(mass, pax, pay), posting| {
                let item = Item::from_posting(posting);
                (mass + item.mass, pax + item.passengers, pay + item.pay)
            });

    Selection {
        postings: postings.into_iter().cloned().collect(),
        total_pay,
        total_mass: u32::try_from(total_mass).unwrap_or(u32::MAX),
        total_passengers: u32::try_from(total_passengers).unwrap_or(u32::MAX),
        exclusive,
    }
}

/// Exact 0/1 knapsack over two capacity dimensions.
///
/// Returns indices into `items` of an optimal subset, in ascending order.
/// Items with no pay or that cannot fit on their own are never chosen.
pub fn solve_knapsack(
    items: &[Item],
    max_mass: u64,
    max_passengers: u64,
    node_budget: u64,
) -> Result<Vec<usize>, SolverError> {
    let mut order: Vec<usize> = (0..items.len())
        .filter(|&idx| items[idx].pay > 0.0 && items[idx].fits(max_mass, max_passengers))
        .collect();
    // Best pay per kilogram first; weightless items lead.
    order.sort_by(|&a, &b| {
        let lhs = items[a].pay * items[b].mass as f64;
        let rhs = items[b].pay * items[a].mass as f64;
        rhs.partial_cmp(&lhs).unwrap_or(Ordering::Equal)
    });
    // Positions in `order` of the passenger items, best pay per head first.
    let mut by_head: Vec<usize> = (0..order.len())
        .filter(|&pos| items[order[pos]].passengers > 0)
        .collect();
    by_head.sort_by(|&a, &b| {
        let (a, b) = (items[order[a]], items[order[b]]);
        let lhs = a.pay * b.passengers as f64;
        let rhs = b.pay * a.passengers as f64;
        rhs.partial_cmp(&lhs).unwrap_or(Ordering::Equal)
    });

    let mut search = Search {
        items,
        order: &order,
        by_head: &by_head,
        taken: vec![false; order.len()],
        best_pay: 0.0,
        best: Vec::new(),
        nodes: 0,
        node_budget,
    };
    search.branch(0, max_mass, max_passengers, 0.0)?;

    let mut picked = search.best;
    picked.sort_unstable();
    Ok(picked)
}

struct Search<'a> {
    items: &'a [Item],
    order: &'a [usize],
    by_head: &'a [usize],
    taken: Vec<bool>,
    best_pay: f64,
    best: Vec<usize>,
    nodes: u64,
    node_budget: u64,
}

impl Search<'_> {
    fn branch(
        &mut self,
        depth: usize,
        mass_left: u64,
        passengers_left: u64,
        pay: f64,
    ) -> Result<(), SolverError> {
        self.nodes += 1;
        if self.nodes > self.node_budget {
            return Err(SolverError::NodeBudgetExhausted(self.node_budget));
        }

        if pay > self.best_pay {
            self.best_pay = pay;
            self.best = self
                .taken
                .iter()
                .enumerate()
                .filter(|(_, &taken)| taken)
                .map(|(pos, _)| self.order[pos])
                .collect();
        }

        if depth == self.order.len()
            || self.upper_bound(depth, mass_left, passengers_left, pay) <= self.best_pay
        {
            return Ok(());
        }

        let item = self.items[self.order[depth]];
        if item.fits(mass_left, passengers_left) {
            self.taken[depth] = true;
            self.branch(
                depth + 1,
                mass_left - item.mass,
                passengers_left - item.passengers,
                pay + item.pay,
            )?;
            self.taken[depth] = false;
        }
        self.branch(depth + 1, mass_left, passengers_left, pay)
    }

    /// Items not yet decided on that fit in what is left.
    fn remaining(
        &self,
        depth: usize,
        mass_left: u64,
        passengers_left: u64,
    ) -> impl Iterator<Item = Item> + '_ {
        self.order[depth..]
            .iter()
            .map(move |&idx| self.items[idx])
            .filter(move |item| item.fits(mass_left, passengers_left))
    }

    /// The smaller of two relaxations over the items that can still fit:
    /// fractional on mass, and fractional on seats with mass ignored.
    fn upper_bound(&self, depth: usize, mass_left: u64, passengers_left: u64, pay: f64) -> f64 {
        let mut by_mass = pay;
        let mut room = mass_left as f64;
        for item in self.remaining(depth, mass_left, passengers_left) {
            if item.mass as f64 <= room {
                room -= item.mass as f64;
                by_mass += item.pay;
            } else {
                by_mass += item.pay * room / item.mass as f64;
                break;
            }
        }

        // Cargo takes no seats, so all of it counts here.
        let mut by_seats = pay
            + self
                .remaining(depth, mass_left, passengers_left)
                .filter(|item| item.passengers == 0)
                .map(|item| item.pay)
                .sum::<f64>();
        let mut seats = passengers_left as f64;
        for &pos in self.by_head {
            if seats <= 0.0 || by_seats >= by_mass {
                break;
            }
            let item = self.items[self.order[pos]];
            if pos < depth || !item.fits(mass_left, passengers_left) {
                continue;
            }
            let heads = item.passengers as f64;
            if heads <= seats {
                seats -= heads;
                by_seats += item.pay;
            } else {
                by_seats += item.pay * seats / heads;
                seats = 0.0;
            }
        }

        by_mass.min(by_seats)
    }
}
