//! The side-scrolling simulation.
//!
//! A fixed-timestep game: gravity pulls the bird down every tick, pipes and
//! coins scroll in from the right, and purchased power-ups temporarily bend
//! the rules. Nothing in here touches the terminal or the network; the
//! session layer reacts to the [`GameEvent`]s returned by [`process_tick`].

pub mod clock;
pub mod logic;
pub mod power_ups;
pub mod types;

pub use clock::TickClock;
pub use logic::*;
pub use power_ups::*;
pub use types::*;
