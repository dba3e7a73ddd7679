use std::fmt::Display;

use serde_repr::{Deserialize_repr, Serialize_repr};

/// The kind of answer a question expects. Serialised as its numeric code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum QuestionType {
    /// Answered in free text.
    TextAnswer = 1,
    /// Answered by picking exactly one option.
    SingleChoice = 2,
    /// Answered by picking any number of options.
    MultipleChoice = 3,
}

impl QuestionType {
    /// Whether answers to this question are chosen from answer options.
    pub fn is_choice(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }
}

impl Display for QuestionType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::TextAnswer => "Text answer",
                Self::SingleChoice => "One choice answer",
                Self::MultipleChoice => "Multiple choice answer",
            }
        )
    }
}
