//! Flappy - terminal Flappy Bird with coins, power-ups and player profiles.
//!
//! The simulation, store and persistence layers are exposed here for
//! testing and for the `flappy` binary.

pub mod accounts;
pub mod achievements;
pub mod build_info;
pub mod config;
pub mod constants;
pub mod error;
pub mod game;
pub mod input;
pub mod logging;
pub mod persistence;
pub mod render;
pub mod session;
pub mod setup;
pub mod store;
pub mod themes;
pub mod ui;
