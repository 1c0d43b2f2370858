use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one generated output: the (prompt, system) pair it belongs to.
///
/// The textual form is `{prompt_id}-{system_id}`. Prompt ids never contain a
/// dash, so parsing splits on the first one and system ids may contain
/// dashes freely.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputKey {
    pub prompt_id: String,
    pub system_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid output id '{0}', expected '{{prompt_id}}-{{system_id}}'")]
pub struct ParseOutputKeyError(String);

impl OutputKey {
    pub fn new(prompt_id: impl Into<String>, system_id: impl Into<String>) -> Self {
        Self {
            prompt_id: prompt_id.into(),
            system_id: system_id.into(),
        }
    }
}

impl FromStr for OutputKey {
    type Err = ParseOutputKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((prompt_id, system_id)) if !prompt_id.is_empty() && !system_id.is_empty() => {
                Ok(Self::new(prompt_id, system_id))
            }
            _ => Err(ParseOutputKeyError(s.to_string())),
        }
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prompt_id, self.system_id)
    }
}
