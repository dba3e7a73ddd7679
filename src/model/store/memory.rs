use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rocket::tokio::sync::Mutex;

use crate::{
    error::{Error, Result},
    model::{
        common::{AnswerId, QuestionId, QuestionnaireId, ResponseId, UserId},
        db::{
            AnswerOption, NewAnswerOption, NewQuestion, NewQuestionnaire, NewUser,
            NewUserResponse, Question, Questionnaire, User, UserResponse,
        },
    },
    rules::validation::AnswerError,
};

use super::{
    listing_order, normalize_choices, AnswerOptionRepo, QuestionRepo, QuestionnaireRepo,
    ResponseRepo, UserRepo,
};

#[derive(Default)]
struct Tables {
    questionnaires: BTreeMap<QuestionnaireId, Questionnaire>,
    questions: BTreeMap<QuestionId, Question>,
    answer_options: BTreeMap<AnswerId, AnswerOption>,
    responses: BTreeMap<ResponseId, UserResponse>,
    users: BTreeMap<UserId, User>,
    counters: HashMap<&'static str, u32>,
}

impl Tables {
    /// Allocate the next ID in the named sequence, starting from 1.
    fn next_id(&mut self, sequence: &'static str) -> u32 {
        let next = self.counters.entry(sequence).or_insert(0);
        *next += 1;
        *next
    }

    fn delete_question(&mut self, id: QuestionId) -> bool {
        if self.questions.remove(&id).is_none() {
            return false;
        }
        self.answer_options
            .retain(|_, option| option.question_id != id);
        self.responses
            .retain(|_, response| response.question_id != id);
        true
    }
}

/// Storage held in process memory, for tests and throwaway deployments.
///
/// Every operation, including the cascading deletes and the uniqueness
/// checks, runs under a single lock acquisition.
#[derive(Default)]
pub struct MemoryStore(Mutex<Tables>);

#[rocket::async_trait]
impl QuestionnaireRepo for MemoryStore {
    async fn questionnaires(&self) -> Result<Vec<Questionnaire>> {
        let tables = self.0.lock().await;
        let mut questionnaires: Vec<_> = tables.questionnaires.values().cloned().collect();
        questionnaires.sort_by(listing_order);
        Ok(questionnaires)
    }

    async fn active_questionnaires(&self, day: NaiveDate) -> Result<Vec<Questionnaire>> {
        let tables = self.0.lock().await;
        let mut questionnaires: Vec<_> = tables
            .questionnaires
            .values()
            .filter(|q| q.is_active_on(day))
            .cloned()
            .collect();
        questionnaires.sort_by(listing_order);
        Ok(questionnaires)
    }

    async fn questionnaire(&self, id: QuestionnaireId) -> Result<Option<Questionnaire>> {
        Ok(self.0.lock().await.questionnaires.get(&id).cloned())
    }

    async fn insert_questionnaire(
        &self,
        questionnaire: NewQuestionnaire,
    ) -> Result<Questionnaire> {
        let mut tables = self.0.lock().await;
        let id = tables.next_id("questionnaires");
        let questionnaire = Questionnaire { id, questionnaire };
        tables.questionnaires.insert(id, questionnaire.clone());
        Ok(questionnaire)
    }

    async fn replace_questionnaire(&self, questionnaire: &Questionnaire) -> Result<()> {
        let mut tables = self.0.lock().await;
        let existing = tables
            .questionnaires
            .get_mut(&questionnaire.id)
            .ok_or_else(|| Error::not_found(format!("Questionnaire {}", questionnaire.id)))?;
        *existing = questionnaire.clone();
        Ok(())
    }

    async fn delete_questionnaire(&self, id: QuestionnaireId) -> Result<bool> {
        let mut tables = self.0.lock().await;
        if tables.questionnaires.remove(&id).is_none() {
            return Ok(false);
        }
        let questions: Vec<QuestionId> = tables
            .questions
            .values()
            .filter(|q| q.questionnaire_id == id)
            .map(|q| q.id)
            .collect();
        for question in questions {
            tables.delete_question(question);
        }
        Ok(true)
    }
}

#[rocket::async_trait]
impl QuestionRepo for MemoryStore {
    async fn questions(&self) -> Result<Vec<Question>> {
        Ok(self.0.lock().await.questions.values().cloned().collect())
    }

    async fn questions_for(&self, questionnaire_id: QuestionnaireId) -> Result<Vec<Question>> {
        Ok(self
            .0
            .lock()
            .await
            .questions
            .values()
            .filter(|q| q.questionnaire_id == questionnaire_id)
            .cloned()
            .collect())
    }

    async fn question(&self, id: QuestionId) -> Result<Option<Question>> {
        Ok(self.0.lock().await.questions.get(&id).cloned())
    }

    async fn insert_question(&self, question: NewQuestion) -> Result<Question> {
        let mut tables = self.0.lock().await;
        let id = tables.next_id("questions");
        let question = Question { id, question };
        tables.questions.insert(id, question.clone());
        Ok(question)
    }

    async fn replace_question(&self, question: &Question) -> Result<()> {
        let mut tables = self.0.lock().await;
        let existing = tables
            .questions
            .get_mut(&question.id)
            .ok_or_else(|| Error::not_found(format!("Question {}", question.id)))?;
        *existing = question.clone();
        Ok(())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool> {
        Ok(self.0.lock().await.delete_question(id))
    }
}

#[rocket::async_trait]
impl AnswerOptionRepo for MemoryStore {
    async fn answer_options(&self) -> Result<Vec<AnswerOption>> {
        Ok(self.0.lock().await.answer_options.values().cloned().collect())
    }

    async fn answer_options_for(&self, question_id: QuestionId) -> Result<Vec<AnswerOption>> {
        Ok(self
            .0
            .lock()
            .await
            .answer_options
            .values()
            .filter(|option| option.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn answer_option(&self, id: AnswerId) -> Result<Option<AnswerOption>> {
        Ok(self.0.lock().await.answer_options.get(&id).cloned())
    }

    async fn insert_answer_option(&self, option: NewAnswerOption) -> Result<AnswerOption> {
        let mut tables = self.0.lock().await;
        let id = tables.next_id("answers");
        let option = AnswerOption { id, option };
        tables.answer_options.insert(id, option.clone());
        Ok(option)
    }

    async fn replace_answer_option(&self, option: &AnswerOption) -> Result<()> {
        let mut tables = self.0.lock().await;
        let existing = tables
            .answer_options
            .get_mut(&option.id)
            .ok_or_else(|| Error::not_found(format!("Answer {}", option.id)))?;
        *existing = option.clone();
        Ok(())
    }

    async fn delete_answer_option(&self, id: AnswerId) -> Result<bool> {
        let mut tables = self.0.lock().await;
        if tables.answer_options.remove(&id).is_none() {
            return Ok(false);
        }
        for response in tables.responses.values_mut() {
            response.choice_answer.retain(|choice| *choice != id);
        }
        Ok(true)
    }
}

#[rocket::async_trait]
impl ResponseRepo for MemoryStore {
    async fn responses(&self) -> Result<Vec<UserResponse>> {
        Ok(self.0.lock().await.responses.values().cloned().collect())
    }

    async fn response(&self, id: ResponseId) -> Result<Option<UserResponse>> {
        Ok(self.0.lock().await.responses.get(&id).cloned())
    }

    async fn responses_for_user(&self, user_id: UserId) -> Result<Vec<UserResponse>> {
        Ok(self
            .0
            .lock()
            .await
            .responses
            .values()
            .filter(|response| response.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn has_response(&self, user_id: UserId, question_id: QuestionId) -> Result<bool> {
        Ok(self
            .0
            .lock()
            .await
            .responses
            .values()
            .any(|r| r.user_id == user_id && r.question_id == question_id))
    }

    async fn insert_response(&self, mut response: NewUserResponse) -> Result<UserResponse> {
        let mut tables = self.0.lock().await;
        if tables
            .responses
            .values()
            .any(|r| r.user_id == response.user_id && r.question_id == response.question_id)
        {
            return Err(AnswerError::AlreadyAnswered.into());
        }
        normalize_choices(&mut response.choice_answer);
        let id = tables.next_id("responses");
        let response = UserResponse { id, response };
        tables.responses.insert(id, response.clone());
        Ok(response)
    }

    async fn delete_response(&self, id: ResponseId) -> Result<bool> {
        Ok(self.0.lock().await.responses.remove(&id).is_some())
    }
}

#[rocket::async_trait]
impl UserRepo for MemoryStore {
    async fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.0.lock().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .0
            .lock()
            .await
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn staff(&self) -> Result<Vec<User>> {
        Ok(self
            .0
            .lock()
            .await
            .users
            .values()
            .filter(|user| user.is_staff)
            .cloned()
            .collect())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.0.lock().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(Error::bad_request(format!(
                "Username already in use: {}",
                user.username
            )));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(Error::bad_request(format!(
                "Email already in use: {}",
                user.email
            )));
        }
        let id = tables.next_id("users");
        let user = User { id, user };
        tables.users.insert(id, user.clone());
        Ok(user)
    }
}
