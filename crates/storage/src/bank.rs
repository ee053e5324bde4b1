//! Question bank loading.
//!
//! Banks are JSON arrays of question objects:
//!
//! ```json
//! [{ "id": 5, "topic": "Climate Change", "difficulty": "Easy",
//!    "question": "What type of radiation is trapped by greenhouse gases?",
//!    "answer": "Infrared radiation.", "marking_points": [["infrared"]] }]
//! ```
//!
//! `base_xp` is optional and defaults to the difficulty's XP.

use std::path::Path;

use quiz_core::model::{
    BankError, Difficulty, KeywordGroup, Question, QuestionBank, QuestionError, QuestionId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankLoadError {
    #[error("failed to read question bank: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid question bank JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question {id}: {source}")]
    Question {
        id: QuestionId,
        #[source]
        source: QuestionError,
    },
    #[error(transparent)]
    Bank(#[from] BankError),
}

/// On-disk shape of a bank question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub topic: String,
    pub difficulty: Difficulty,
    pub question: String,
    pub answer: String,
    #[serde(default, alias = "markingPoints")]
    pub marking_points: Vec<KeywordGroup>,
    #[serde(default, alias = "baseXP")]
    pub base_xp: Option<u32>,
}

impl QuestionRecord {
    /// Convert the record into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the topic or prompt is blank.
    pub fn into_question(self) -> Result<Question, QuestionError> {
        let question = Question::new(
            self.id,
            self.topic,
            self.difficulty,
            self.question,
            self.answer,
            self.marking_points,
        )?;
        Ok(match self.base_xp {
            Some(xp) => question.with_base_xp(xp),
            None => question,
        })
    }
}

/// Parse a bank from JSON text.
///
/// # Errors
///
/// Returns `BankLoadError` for malformed JSON, invalid questions or duplicate ids.
pub fn parse_bank(json: &str) -> Result<QuestionBank, BankLoadError> {
    let records: Vec<QuestionRecord> = serde_json::from_str(json)?;
    let mut questions = Vec::with_capacity(records.len());
    for record in records {
        let id = record.id;
        let question = record
            .into_question()
            .map_err(|source| BankLoadError::Question { id, source })?;
        questions.push(question);
    }
    Ok(QuestionBank::new(questions)?)
}

/// Read and parse a bank file.
///
/// # Errors
///
/// Returns `BankLoadError` if the file cannot be read or parsed.
pub async fn load_bank(path: impl AsRef<Path>) -> Result<QuestionBank, BankLoadError> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path).await?;
    let bank = parse_bank(&json)?;
    tracing::debug!(path = %path.display(), questions = bank.len(), "loaded question bank");
    Ok(bank)
}

const SAMPLE_BANK: &str = r#"[
  {
    "id": 1,
    "topic": "Photosynthesis",
    "difficulty": "Medium",
    "question": "Why do thylakoid membranes contain many types of pigments?",
    "answer": "To absorb light over a wide range of wavelengths, maximizing photosynthesis.",
    "marking_points": [["absorb", "absorption"], ["light"], ["wavelengths", "range"], ["photosynthesis"]]
  },
  {
    "id": 2,
    "topic": "Photosynthesis",
    "difficulty": "Hard",
    "question": "Explain the role of light energy in photosynthesis.",
    "answer": "Light excites electrons in chlorophyll, producing ATP and NADPH and enabling photolysis of water.",
    "marking_points": [["light"], ["excite", "excited", "excitation"], ["electron", "electrons"], ["ATP"], ["NADPH"], ["photolysis", "water"]]
  },
  {
    "id": 3,
    "topic": "Ecosystems",
    "difficulty": "Hard",
    "question": "What is net primary productivity (NPP)?",
    "answer": "Energy stored by producers after respiration, available to the next trophic level.",
    "marking_points": [["energy", "biomass", "chemical energy"], ["producer", "plant", "autotroph"], ["respiration", "respired", "respiratory"], ["trophic", "consumer", "food level"]]
  },
  {
    "id": 4,
    "topic": "Ecology",
    "difficulty": "Medium",
    "question": "Why does ecological succession occur in stages?",
    "answer": "Each stage improves the habitat, allowing new species to colonize.",
    "marking_points": [["habitat"], ["improve", "modify", "change"], ["species", "colonize", "appear"]]
  },
  {
    "id": 5,
    "topic": "Climate Change",
    "difficulty": "Easy",
    "question": "What type of radiation is trapped by greenhouse gases?",
    "answer": "Infrared radiation.",
    "marking_points": [["infrared"]]
  }
]"#;

/// The bundled biology revision bank.
///
/// # Errors
///
/// Returns `BankLoadError` only if the embedded data is malformed.
pub fn sample_bank() -> Result<QuestionBank, BankLoadError> {
    parse_bank(SAMPLE_BANK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_bank_parses() {
        let bank = sample_bank().unwrap();
        assert_eq!(bank.len(), 5);
        let hard = bank.get(QuestionId::new(2)).unwrap();
        assert_eq!(hard.base_xp(), 8);
        assert_eq!(hard.max_score(), 6);
    }

    #[test]
    fn accepts_camel_case_fields_and_explicit_xp() {
        let bank = parse_bank(
            r#"[{"id": 9, "topic": "Cells", "difficulty": "Easy",
                 "question": "Name the powerhouse of the cell.", "answer": "Mitochondria",
                 "markingPoints": [["mitochondria", "mitochondrion"]], "baseXP": 3}]"#,
        )
        .unwrap();
        let q = bank.get(QuestionId::new(9)).unwrap();
        assert_eq!(q.base_xp(), 3);
        assert_eq!(q.marking_points().len(), 1);
    }

    #[test]
    fn reports_duplicate_ids() {
        let json = r#"[
            {"id": 1, "topic": "A", "difficulty": "Easy", "question": "Q", "answer": "A"},
            {"id": 1, "topic": "B", "difficulty": "Easy", "question": "Q", "answer": "A"}
        ]"#;
        assert!(matches!(
            parse_bank(json),
            Err(BankLoadError::Bank(BankError::DuplicateId(id))) if id == QuestionId::new(1)
        ));
    }

    #[test]
    fn reports_invalid_question_with_id() {
        let json = r#"[{"id": 4, "topic": "A", "difficulty": "Easy", "question": " ", "answer": "A"}]"#;
        let err = parse_bank(json).unwrap_err();
        assert!(err.to_string().starts_with("question 4:"));
    }

    #[test]
    fn empty_array_is_an_empty_bank() {
        assert!(parse_bank("[]").unwrap().is_empty());
    }
}
