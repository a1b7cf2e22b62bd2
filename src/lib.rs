//! Finds the most profitable FSEconomy assignments for rentable aircraft
//! near the jobs.

pub mod app;
pub mod domain;
pub mod infra;
pub mod util;
