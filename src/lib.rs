//! Essence Tracker - identity continuity and outcome tracking for essence
//! monoliths seen through a sampled perception feed

pub mod classify;
pub mod core;
pub mod display;
pub mod outcome;
pub mod perception;
pub mod scenario;
pub mod scheduler;
pub mod tracking;
