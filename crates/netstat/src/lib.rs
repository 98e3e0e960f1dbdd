//! Network interface statistics collector
//!
//! This crate provides:
//! - Interface discovery from a sysfs-style directory
//! - Per-tick statistics reading and gauge sample emission
//! - A lifecycle controller driven by a host scheduler
//! - Health checks and observability

pub mod collector;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod models;
pub mod observability;

pub use error::{NetstatError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use lifecycle::{LifecycleState, NetstatPlugin};
pub use models::*;
pub use observability::{AgentMetrics, StructuredLogger};
