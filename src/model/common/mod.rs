use chrono::{NaiveDate, Utc};

mod question_type;

pub use question_type::QuestionType;

/// Our questionnaire IDs are integers.
pub type QuestionnaireId = u32;
/// Our question IDs are integers.
pub type QuestionId = u32;
/// Our answer option IDs are integers.
pub type AnswerId = u32;
/// Our user response IDs are integers.
pub type ResponseId = u32;
/// User IDs are integers. Responses carry them as opaque identities rather
/// than references to registered accounts.
pub type UserId = u32;

/// The current calendar day, used to decide which questionnaires are active.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
