//! DB-compatible (e.g. de/serialisable) types.
//!
//! Every record carries its integer ID as `_id`, and the remaining fields are
//! flattened alongside it.

pub mod answer;
pub mod question;
pub mod questionnaire;
pub mod response;
pub mod user;

pub use answer::{AnswerOption, AnswerOptionCore, NewAnswerOption};
pub use question::{NewQuestion, Question, QuestionCore};
pub use questionnaire::{NewQuestionnaire, Questionnaire, QuestionnaireCore};
pub use response::{NewUserResponse, UserResponse, UserResponseCore};
pub use user::{NewUser, User, UserCore};
