//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the lifetime of a
//! client.
//!
//! # Tasks
//! - Maintenance: prunes history snapshots and analytics log entries past
//!   their retention windows

mod maintenance;

pub use maintenance::spawn_maintenance_task;
