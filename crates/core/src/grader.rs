//! Keyword-based answer grading.
//!
//! Every marking point is an independent group of interchangeable keywords.
//! A group earns its mark when any keyword appears, case-insensitively, as a
//! substring of the learner's answer. Grading is pure and never fails.

use crate::model::{KeywordGroup, Question, QuestionScore};

/// Score `answer` against `marking_points`, one mark per satisfied group.
#[must_use]
pub fn grade(answer: &str, marking_points: &[KeywordGroup]) -> u32 {
    let lowered = answer.to_lowercase();
    let hits = marking_points
        .iter()
        .filter(|group| group_matches(&lowered, group))
        .count();
    u32::try_from(hits).unwrap_or(u32::MAX)
}

/// Highest score obtainable for the given marking points.
#[must_use]
pub fn max_score(marking_points: &[KeywordGroup]) -> u32 {
    u32::try_from(marking_points.len()).unwrap_or(u32::MAX)
}

/// Grade one question's answer and capture it for the results view.
#[must_use]
pub fn grade_question(question: &Question, answer: &str) -> QuestionScore {
    QuestionScore {
        question_id: question.id(),
        topic: question.topic().to_owned(),
        answer: answer.to_owned(),
        score: grade(answer, question.marking_points()),
        max_score: max_score(question.marking_points()),
    }
}

fn group_matches(lowered_answer: &str, group: &KeywordGroup) -> bool {
    group.keywords().iter().any(|keyword| {
        // A blank keyword would be a substring of every answer.
        !keyword.trim().is_empty() && lowered_answer.contains(&keyword.to_lowercase())
    })
}
