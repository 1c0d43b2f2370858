pub mod language;
pub mod output_key;
pub mod scoring;
pub mod task;
pub mod vote_value;

pub use language::Language;
pub use output_key::OutputKey;
pub use scoring::{ScoringRecord, Winner};
pub use task::{KNOWN_TASKS, Task};
pub use vote_value::VoteValue;
