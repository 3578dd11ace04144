pub mod cell;
pub mod direction;
pub mod generator;
pub mod grid;
pub mod player;
pub mod rules;
