//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache.
//!
//! # Tasks
//! - Expiry reaper: removes cache entries once their max age has passed

mod reaper;

pub(crate) use reaper::{spawn_expiry_task, Reap};
