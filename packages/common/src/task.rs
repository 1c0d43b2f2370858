use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tasks of the original shared-task deployment. Anything matching the task
/// key format is accepted; this list only seeds defaults (e.g. the baseline
/// loader ingests every one of them).
pub const KNOWN_TASKS: &[&str] = &["a-en", "a-es", "a-zh", "b1", "b2"];

const MAX_TASK_LEN: usize = 32;

/// An annotation task: an independent pool of prompts, outputs and votes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Task(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseTaskError {
    #[error("Task must not be empty")]
    Empty,
    #[error("Task must be at most {MAX_TASK_LEN} characters")]
    TooLong,
    #[error("Task '{0}' may only contain lowercase ASCII letters, digits, '-' and '_'")]
    InvalidCharacter(String),
}

impl Task {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// All tasks in [`KNOWN_TASKS`].
    pub fn known() -> Vec<Task> {
        KNOWN_TASKS.iter().map(|t| Task(t.to_string())).collect()
    }
}

impl FromStr for Task {
    type Err = ParseTaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseTaskError::Empty);
        }
        if s.len() > MAX_TASK_LEN {
            return Err(ParseTaskError::TooLong);
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
        {
            return Err(ParseTaskError::InvalidCharacter(s.to_string()));
        }
        Ok(Task(s.to_string()))
    }
}

impl TryFrom<String> for Task {
    type Error = ParseTaskError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Task> for String {
    fn from(task: Task) -> Self {
        task.0
    }
}

impl AsRef<str> for Task {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
