//! Doubles court rota: fair benching, varied partnerships, and a background
//! loop that repairs repeated pairs.

pub mod config;
pub mod display;
pub mod error;
pub mod form;
pub mod generation;
pub mod pool;
pub mod schedule;
pub mod store;
pub mod web;

pub use error::{Result, RotaError};
