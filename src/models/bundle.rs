// src/models/bundle.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::quiz::{AnswerValue, Question, Quiz, QuizSummary};

pub const FORMAT_VERSION: &str = "1.0";

/// Portable quiz export, as exchanged by the export/import feature.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizBundle {
    #[validate(nested)]
    pub quiz_data: BundledQuiz,
    #[validate(nested)]
    pub metadata: BundleMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BundledQuiz {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(length(min = 1, max = 20))]
    pub difficulty: String,
    #[validate(range(min = 1))]
    pub time_limit: i64,
    #[validate(length(min = 1, message = "Quiz must have at least one question"), nested)]
    pub questions: Vec<BundledQuestion>,
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_question_answer))]
pub struct BundledQuestion {
    #[validate(length(min = 1, max = 1000))]
    pub question_text: String,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    pub correct_answer: AnswerValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BundleMetadata {
    pub exported_by: String,
    #[validate(custom(function = validate_format_version))]
    pub format_version: String,
}

fn validate_format_version(version: &str) -> Result<(), ValidationError> {
    if version != FORMAT_VERSION {
        return Err(ValidationError::new("unsupported_format_version"));
    }
    Ok(())
}

fn validate_question_answer(question: &BundledQuestion) -> Result<(), ValidationError> {
    match (&question.options, &question.correct_answer) {
        (Some(options), _) if options.len() < 2 => {
            Err(ValidationError::new("options_need_at_least_two"))
        }
        (Some(options), AnswerValue::Choice(index)) if *index >= options.len() => {
            Err(ValidationError::new("correct_answer_out_of_range"))
        }
        (None, AnswerValue::Choice(_)) => Err(ValidationError::new("choice_without_options")),
        _ => Ok(()),
    }
}

impl QuizBundle {
    pub fn export(quiz: &Quiz) -> Self {
        Self {
            quiz_data: BundledQuiz {
                title: quiz.title.clone(),
                description: quiz.description.clone(),
                category: quiz.category.clone(),
                difficulty: quiz.difficulty.clone(),
                time_limit: quiz.time_limit,
                questions: quiz.questions.iter().map(BundledQuestion::from).collect(),
                export_date: Some(Utc::now()),
            },
            metadata: BundleMetadata {
                exported_by: "QuizMaster".to_string(),
                format_version: FORMAT_VERSION.to_string(),
            },
        }
    }

    /// Summary of what an import would create. Only meaningful after `validate()`.
    pub fn summary(&self) -> QuizSummary {
        let quiz = &self.quiz_data;
        QuizSummary {
            id: 0,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            category: quiz.category.clone(),
            difficulty: quiz.difficulty.clone(),
            time_limit: quiz.time_limit,
            question_count: quiz.questions.len(),
        }
    }
}

impl From<&Question> for BundledQuestion {
    fn from(q: &Question) -> Self {
        Self {
            question_text: q.question_text.clone(),
            question_type: Some(q.question_type.clone()),
            options: q.options.clone(),
            correct_answer: q.correct_answer.clone(),
        }
    }
}
