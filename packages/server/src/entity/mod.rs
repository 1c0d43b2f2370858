pub mod output;
pub mod participant;
pub mod prompt;
pub mod system;
pub mod vote;
