use serde::{Deserialize, Serialize};

/// One row of the interview question dataset. Headers follow the Korean
/// column names the dataset is published with.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "질문", default)]
    pub text: Option<String>,
    #[serde(rename = "기업명", default)]
    pub company: String,
    #[serde(rename = "경력", default)]
    pub experience_level: String,
    #[serde(rename = "직무", default)]
    pub role: String,
}

impl QuestionRecord {
    pub fn new(
        text: impl Into<String>,
        company: impl Into<String>,
        experience_level: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            text: Some(text.into()),
            company: company.into(),
            experience_level: experience_level.into(),
            role: role.into(),
        }
    }

    /// Question text, or `None` when the cell is missing or whitespace-only.
    pub fn question(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn metadata(&self) -> QuestionMetadata {
        QuestionMetadata {
            company: self.company.clone(),
            experience_level: self.experience_level.clone(),
            role: self.role.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionMetadata {
    pub company: String,
    pub experience_level: String,
    pub role: String,
}

/// A stored unit of the index. `content` is both what gets embedded and what
/// is shown back to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub content: String,
    pub metadata: QuestionMetadata,
    pub embedding: Vec<f32>,
}

/// Search hit returned to callers, most similar first.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityResult {
    pub content: String,
    pub metadata: QuestionMetadata,
    pub score: f32,
}

/// Builds the embedded text for a record: the question followed by a
/// bracketed company / experience / role annotation.
pub fn annotate_question(text: &str, metadata: &QuestionMetadata) -> String {
    format!(
        "{text} [기업명: {}, 경력: {}, 직무: {}]",
        metadata.company, metadata.experience_level, metadata.role
    )
}
