use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        common::{today, QuestionnaireId},
        db::{NewQuestionnaire, Questionnaire, QuestionnaireCore},
    },
};

use super::deserialize_some;

pub const MAX_TITLE_LENGTH: usize = 50;

fn check_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        Err(Error::bad_request("Questionnaire title must not be empty."))
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        Err(Error::bad_request(format!(
            "Questionnaire title must be at most {MAX_TITLE_LENGTH} characters."
        )))
    } else {
        Ok(())
    }
}

/// A questionnaire specification, as submitted on creation or full update.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuestionnaireSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date_start: Option<NaiveDate>,
    #[serde(default)]
    pub date_stop: Option<NaiveDate>,
}

impl TryFrom<QuestionnaireSpec> for NewQuestionnaire {
    type Error = Error;

    fn try_from(spec: QuestionnaireSpec) -> Result<Self> {
        check_title(&spec.title)?;
        Ok(Self {
            title: spec.title,
            description: spec.description,
            date_start: spec.date_start,
            date_stop: spec.date_stop,
        })
    }
}

/// A partial questionnaire update. An explicit `null` clears a date.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuestionnairePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub date_start: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub date_stop: Option<Option<NaiveDate>>,
}

impl QuestionnairePatch {
    pub fn apply(self, questionnaire: &mut QuestionnaireCore) -> Result<()> {
        if let Some(title) = self.title {
            check_title(&title)?;
            questionnaire.title = title;
        }
        if let Some(description) = self.description {
            questionnaire.description = description;
        }
        if let Some(date_start) = self.date_start {
            questionnaire.date_start = date_start;
        }
        if let Some(date_stop) = self.date_stop {
            questionnaire.date_stop = date_stop;
        }
        Ok(())
    }
}

/// A questionnaire as shown to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireDescription {
    pub id: QuestionnaireId,
    pub title: String,
    pub description: String,
    pub date_start: Option<NaiveDate>,
    pub date_stop: Option<NaiveDate>,
    /// Derived from the dates on the day of the request.
    pub is_active: bool,
}

impl QuestionnaireDescription {
    pub fn new(questionnaire: Questionnaire, day: NaiveDate) -> Self {
        let is_active = questionnaire.is_active_on(day);
        let Questionnaire { id, questionnaire } = questionnaire;
        Self {
            id,
            title: questionnaire.title,
            description: questionnaire.description,
            date_start: questionnaire.date_start,
            date_stop: questionnaire.date_stop,
            is_active,
        }
    }
}

impl From<Questionnaire> for QuestionnaireDescription {
    fn from(questionnaire: Questionnaire) -> Self {
        Self::new(questionnaire, today())
    }
}
