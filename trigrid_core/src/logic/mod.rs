pub mod board;
pub mod game;
pub mod generator;
pub mod layout;
pub mod lookup;
pub mod rules;
pub mod snapshot;
