//! # Nudge Scheduler
//!
//! Timezone-aware daily schedule engine and fan-out dispatcher.
//!
//! ## Design
//! - No cron daemon, no job queue — a recompute-and-sleep loop on tokio
//!   timers. Each cycle recomputes the next wall-clock target, so DST
//!   shifts, clock adjustments, and process restarts never cause drift,
//!   skipped days, or duplicated fires.
//! - No catch-up: a fire instant that passes while the process is down is
//!   lost. At most one dispatch.
//!
//! ## Architecture
//! ```text
//! SchedulerEngine (tokio sleep until next "HH:MM" in tz)
//!   └── on fire → Dispatcher
//!                   ├── fixed override chat, or SubscriberStore snapshot
//!                   ├── MessagePool: random body + footer
//!                   └── concurrent per-recipient delivery, failures isolated
//! ```

pub mod dispatch;
pub mod engine;
pub mod schedule;

pub use dispatch::{DispatchSummary, Dispatcher};
pub use engine::SchedulerEngine;
pub use schedule::{next_fire, parse_times, parse_timezone, ScheduleEntry};
