//! Application-level configuration.
//!
//! - [`SchedulerConfig`]: adversarial cap, turn timing and context windows
//!   used by the [`TurnScheduler`](crate::use_cases::turn_scheduler::TurnScheduler)

pub mod scheduler_config;

pub use scheduler_config::{ContextWindows, SchedulerConfig, TurnTiming};
