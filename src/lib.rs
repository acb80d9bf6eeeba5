//! Elevator Dispatch Simulation Library
//!
//! A multi-elevator dispatch simulation that runs headless, one discrete tick
//! at a time.

pub mod simulation;
