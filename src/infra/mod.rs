//! Everything that talks to the outside world: the data feed, files on disk.

pub mod cache;
pub mod fse;
pub mod rate_limit;
pub mod reference;
pub mod retry;
