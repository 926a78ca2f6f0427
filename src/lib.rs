//! Self-administered pure-tone hearing test.
//!
//! [`core`](crate::core) holds the staircase and result types, [`audio`] the tone-player
//! seam, and [`session`] the sweep controller that ties them together.

pub mod audio;
pub mod cli;
pub mod config;
pub mod core;
pub mod report;
pub mod session;
pub mod sim;
