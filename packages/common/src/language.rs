use serde::{Deserialize, Serialize};

/// Language a prompt is written in, derived from its id prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    Zh,
}

impl Language {
    /// `es_*` and `zh_*` prompts are Spanish and Chinese; everything else,
    /// image prompts included, is English.
    pub fn from_prompt_id(prompt_id: &str) -> Self {
        if prompt_id.starts_with("es_") {
            Self::Es
        } else if prompt_id.starts_with("zh_") {
            Self::Zh
        } else {
            Self::En
        }
    }

    /// The language name used by the rating engine's battle format.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Spanish",
            Self::Zh => "Chinese",
        }
    }
}
