//! State machines for the client's long-lived status indicators.

pub mod engine_status_sm;
