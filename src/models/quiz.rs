// src/models/quiz.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{session::error::SessionError, utils::html::clean_html};

/// A respondent's answer, or a question's correct answer.
///
/// Serialized untagged: a JSON number is an option index, a JSON string is
/// free text (or the literal option string). Two values are equal only if
/// both the variant and the value match, so `Choice(1)` never equals `Text("1")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Choice(usize),
    Text(String),
}

/// A quiz as delivered by the catalog backend, correct answers included.
/// Never serialized back to the browser; see `PublicQuestion`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub difficulty: String,

    /// Time limit in seconds.
    pub time_limit: i64,

    /// Ordered question sequence.
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique within the quiz.
    pub id: i64,

    pub question_text: String,

    /// 'multiple_choice', 'true_false' or 'text'.
    #[serde(default = "default_question_type")]
    pub question_type: String,

    /// `None` for free-text questions.
    #[serde(default)]
    pub options: Option<Vec<String>>,

    pub correct_answer: AnswerValue,
}

fn default_question_type() -> String {
    "multiple_choice".to_string()
}

impl Quiz {
    /// Rejects quizzes that cannot be attempted: no questions, a
    /// non-positive time limit, or two questions sharing an id.
    pub fn validate_for_session(&self) -> Result<(), SessionError> {
        if self.questions.is_empty() {
            return Err(SessionError::Configuration(format!(
                "Quiz {} has no questions",
                self.id
            )));
        }
        if self.time_limit <= 0 {
            return Err(SessionError::Configuration(format!(
                "Quiz {} has an invalid time limit of {}s",
                self.id, self.time_limit
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.questions.iter().find(|q| !seen.insert(q.id)) {
            return Err(SessionError::Configuration(format!(
                "Quiz {} has duplicate question id {}",
                self.id, dup.id
            )));
        }
        Ok(())
    }

    pub fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn summary(&self) -> QuizSummary {
        QuizSummary {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            difficulty: self.difficulty.clone(),
            time_limit: self.time_limit,
            question_count: self.questions.len(),
        }
    }
}

/// DTO for sending a question to the browser (excludes the correct answer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub question_type: String,
    pub options: Option<Vec<String>>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question_text: clean_html(&q.question_text),
            question_type: q.question_type.clone(),
            options: q
                .options
                .as_ref()
                .map(|opts| opts.iter().map(|o| clean_html(o)).collect()),
        }
    }
}

/// List-view row for quiz browsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub difficulty: String,
    pub time_limit: i64,
    #[serde(default)]
    pub question_count: usize,
}

/// Query parameters for quiz browsing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizFilter {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    /// Case-insensitive substring over title, description and category.
    pub search: Option<String>,
}

impl QuizFilter {
    pub fn matches(&self, quiz: &QuizSummary) -> bool {
        if let Some(category) = non_empty(&self.category) {
            if quiz.category != category {
                return false;
            }
        }
        if let Some(difficulty) = non_empty(&self.difficulty) {
            if quiz.difficulty != difficulty {
                return false;
            }
        }
        if let Some(term) = non_empty(&self.search) {
            let term = term.to_lowercase();
            let description = quiz.description.as_deref().unwrap_or_default();
            return quiz.title.to_lowercase().contains(&term)
                || description.to_lowercase().contains(&term)
                || quiz.category.to_lowercase().contains(&term);
        }
        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
