use common::Language;
use serde::{Deserialize, Serialize};

use crate::entity::prompt;
use crate::selection::Battle;

/// Query parameters for `GET /battles`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct BattleQuery {
    /// Task to draw battles from. Defaults to the configured task.
    #[param(example = "a-en")]
    pub task: Option<String>,
}

/// Two outputs of one prompt, ready to be compared.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BattleResponse {
    #[schema(example = "en_001")]
    pub prompt_id: String,
    /// Prompt shown to the annotator, as HTML. Absent for bare image prompts.
    #[schema(example = "<b>News headline:</b> Cats land on the moon")]
    pub prompt: Option<String>,
    pub prompt_image_url: Option<String>,
    #[schema(example = "team-a")]
    pub system_id_a: String,
    pub output_a: String,
    #[schema(example = "baseline")]
    pub system_id_b: String,
    pub output_b: String,
}

impl From<Battle> for BattleResponse {
    fn from(battle: Battle) -> Self {
        Self {
            prompt: verbalize(&battle.prompt),
            prompt_image_url: battle.prompt.url.clone(),
            prompt_id: battle.prompt.id,
            system_id_a: battle.system_id_a,
            output_a: battle.output_a,
            system_id_b: battle.system_id_b,
            output_b: battle.output_b,
        }
    }
}

/// Render a prompt for annotators, in the prompt's own language.
pub fn verbalize(prompt: &prompt::Model) -> Option<String> {
    let language = Language::from_prompt_id(&prompt.id);

    if let (Some(w1), Some(w2)) = (&prompt.word1, &prompt.word2) {
        return Some(match language {
            Language::En => {
                format!("The outputs must contain the words <b>{w1}</b> and <b>{w2}</b>.")
            }
            Language::Es => {
                format!("La salidas deben contener las palabras <b>{w1}</b> y <b>{w2}</b>.")
            }
            Language::Zh => format!("输出需要包含词语“<b>{w1}</b>”和“<b>{w2}</b>”。"),
        });
    }

    if let Some(headline) = &prompt.headline {
        return Some(match language {
            Language::En => format!("<b>News headline:</b> {headline}"),
            Language::Es => format!("<b>Titular:</b> {headline}"),
            Language::Zh => format!("<b>新闻标题:</b> {headline}"),
        });
    }

    prompt.prompt.clone()
}
