//! Aggregation engine: library collection, groups and their common tracks

pub mod collector;
pub mod error;
pub mod facade;
pub mod intersection;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;
