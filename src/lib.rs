//! timeet: meeting timers, participant membership and estimated-vs-actual reports,
//! built with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
