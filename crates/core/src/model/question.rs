use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyPrompt,

    #[error("question topic cannot be empty")]
    EmptyTopic,
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// How hard a question is; drives the default XP reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// XP awarded for a question of this difficulty when the bank does not
    /// specify one explicitly.
    #[must_use]
    pub fn default_xp(self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 5,
            Difficulty::Hard => 8,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(label)
    }
}

//
// ─── MARKING POINTS ────────────────────────────────────────────────────────────
//

/// One marking point: a set of interchangeable keywords worth a single mark.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordGroup(Vec<String>);

impl KeywordGroup {
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keywords.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.0
    }

    /// A group without keywords can never be satisfied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KeywordGroup {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single bank question with its keyword marking scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    topic: String,
    difficulty: Difficulty,
    prompt: String,
    answer: String,
    marking_points: Vec<KeywordGroup>,
    base_xp: u32,
}

impl Question {
    /// Creates a question, defaulting `base_xp` from the difficulty.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or topic is blank.
    pub fn new(
        id: QuestionId,
        topic: impl Into<String>,
        difficulty: Difficulty,
        prompt: impl Into<String>,
        answer: impl Into<String>,
        marking_points: Vec<KeywordGroup>,
    ) -> Result<Self, QuestionError> {
        let topic = topic.into();
        let prompt = prompt.into();
        if topic.trim().is_empty() {
            return Err(QuestionError::EmptyTopic);
        }
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        Ok(Self {
            id,
            topic,
            difficulty,
            prompt,
            answer: answer.into(),
            marking_points,
            base_xp: difficulty.default_xp(),
        })
    }

    /// Overrides the XP reward for this question.
    #[must_use]
    pub fn with_base_xp(mut self, base_xp: u32) -> Self {
        self.base_xp = base_xp;
        self
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The model answer shown after submission.
    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn marking_points(&self) -> &[KeywordGroup] {
        &self.marking_points
    }

    /// Highest score this question can earn: one mark per group.
    #[must_use]
    pub fn max_score(&self) -> u32 {
        u32::try_from(self.marking_points.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn base_xp(&self) -> u32 {
        self.base_xp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_prompt() {
        let err = Question::new(
            QuestionId::new(1),
            "Ecology",
            Difficulty::Easy,
            "   ",
            "",
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn base_xp_follows_difficulty_unless_overridden() {
        let q = Question::new(
            QuestionId::new(1),
            "Photosynthesis",
            Difficulty::Hard,
            "Explain the role of light energy.",
            "Light excites electrons.",
            vec![KeywordGroup::new(["light"])],
        )
        .unwrap();
        assert_eq!(q.base_xp(), 8);
        assert_eq!(q.with_base_xp(12).base_xp(), 12);
    }

    #[test]
    fn keyword_group_deserializes_from_plain_array() {
        let groups: Vec<KeywordGroup> =
            serde_json::from_str(r#"[["absorb", "absorption"], ["light"]]"#).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].keywords(), ["absorb", "absorption"]);
    }
}
