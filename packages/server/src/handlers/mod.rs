pub mod battle;
pub mod participant;
pub mod stats;
pub mod vote;
