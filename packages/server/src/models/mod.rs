pub mod battle;
pub mod participant;
pub mod shared;
pub mod stats;
pub mod vote;
