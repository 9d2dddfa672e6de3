//! Session domain module
//!
//! Per-session tool state: which tools the current model can use, cached
//! availability with expiry, execution statistics and session-level
//! configuration. The application layer's `SessionStateManager` owns the
//! concurrent map of these aggregates.
//!
//! - [`state::SessionToolState`] — aggregate for one session
//! - [`state::ToolAvailabilityInfo`] — cached availability entry per tool
//! - [`config::SessionConfig`] — session-level overrides (allow/block lists,
//!   timeouts, concurrency)

pub mod config;
pub mod state;

pub use config::SessionConfig;
pub use state::{
    AvailabilityState, CapabilityLevel, ModelCapabilityInfo, SessionToolState,
    ToolAvailabilityInfo,
};
