//! Cross-module integration tests
//!
//! Everything here drives the engine through [`OracleApi`] only, the way a
//! reporter gateway or the issuance module would.
//!
//! [`OracleApi`]: oracle_aggregation::OracleApi


#[cfg(test)]
mod concurrency;
#[cfg(test)]
mod observability;
#[cfg(test)]
mod scenarios;
