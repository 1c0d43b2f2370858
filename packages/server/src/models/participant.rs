use serde::Deserialize;

/// Form body of `POST /prolific-finish`.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct FinishForm {
    /// Free-text feedback about the study.
    #[serde(default)]
    #[schema(example = "Some outputs were hard to read.")]
    pub comments: String,
}
