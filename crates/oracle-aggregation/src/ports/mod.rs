//! Ports module for the aggregation engine

pub mod inbound;
pub mod outbound;

pub use inbound::{LatestValue, OracleApi, SubmissionRequest, SubmitReceipt};
pub use outbound::{OracleEventSink, SnapshotStore, TimeSource};
