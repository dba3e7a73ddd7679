//! Acceptance rules for a user's response to a question.

use thiserror::Error;

use crate::model::common::{AnswerId, QuestionType};

/// Reasons to refuse a submitted response.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    #[error("The user already has an answer to this question.")]
    AlreadyAnswered,
    #[error("It is forbidden to answer simultaneously with the text and the choice of answers.")]
    TextAndChoice,
    #[error("There should be no textual response.")]
    UnexpectedText,
    #[error("The answer must be text.")]
    ExpectedText,
    #[error("This question requires only one answer option.")]
    TooManyChoices,
    #[error("The question must be answered.")]
    Unanswered,
}

/// Decide whether a response may be stored.
///
/// The checks are ordered and the first failure wins, since a single
/// submission can break several rules at once. `already_answered` says
/// whether this user has answered this question before.
pub fn validate(
    question_type: QuestionType,
    already_answered: bool,
    text_answer: &str,
    choice_answer: &[AnswerId],
) -> Result<(), AnswerError> {
    let has_text = !text_answer.is_empty();
    let has_choice = !choice_answer.is_empty();

    if already_answered {
        Err(AnswerError::AlreadyAnswered)
    } else if has_text && has_choice {
        Err(AnswerError::TextAndChoice)
    } else if has_text && question_type.is_choice() {
        Err(AnswerError::UnexpectedText)
    } else if has_choice && question_type == QuestionType::TextAnswer {
        Err(AnswerError::ExpectedText)
    } else if choice_answer.len() > 1 && question_type == QuestionType::SingleChoice {
        Err(AnswerError::TooManyChoices)
    } else if !has_text && !has_choice {
        Err(AnswerError::Unanswered)
    } else {
        Ok(())
    }
}
