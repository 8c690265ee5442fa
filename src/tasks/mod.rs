//! Background Tasks Module
//!
//! Contains the long-running tasks spawned by the cache service.
//!
//! # Tasks
//! - Dispatch workers: pull pending loads from the scheduled queue and run
//!   them through the fetcher, at most one load per worker

mod worker;

pub use worker::spawn_dispatch_workers;
