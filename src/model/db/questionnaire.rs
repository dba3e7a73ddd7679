use std::ops::{Deref, DerefMut};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::common::QuestionnaireId;

/// Core questionnaire data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireCore {
    pub title: String,
    pub description: String,
    /// Once set, the questions and answer options can no longer be edited.
    pub date_start: Option<NaiveDate>,
    pub date_stop: Option<NaiveDate>,
}

impl QuestionnaireCore {
    /// Is the questionnaire open on the given day?
    ///
    /// Both ends of the window are inclusive, and a questionnaire missing
    /// either date is never active.
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        match (self.date_start, self.date_stop) {
            (Some(start), Some(stop)) => start <= day && day <= stop,
            _ => false,
        }
    }
}

/// A questionnaire without an ID.
pub type NewQuestionnaire = QuestionnaireCore;

/// A questionnaire from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questionnaire {
    #[serde(rename = "_id")]
    pub id: QuestionnaireId,
    #[serde(flatten)]
    pub questionnaire: QuestionnaireCore,
}

impl Deref for Questionnaire {
    type Target = QuestionnaireCore;

    fn deref(&self) -> &Self::Target {
        &self.questionnaire
    }
}

impl DerefMut for Questionnaire {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.questionnaire
    }
}


/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl QuestionnaireCore {
        pub fn example() -> Self {
            Self {
                title: "Weather".to_string(),
                description: "Weather questionnaire.".to_string(),
                date_start: None,
                date_stop: None,
            }
        }

        pub fn example2() -> Self {
            Self {
                title: "Clothes".to_string(),
                description: "Clothes questionnaire.".to_string(),
                date_start: None,
                date_stop: None,
            }
        }
    }
}
