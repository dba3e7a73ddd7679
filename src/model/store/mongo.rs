use chrono::NaiveDate;
use mongodb::{
    bson::{doc, Document},
    options::FindOptions,
    Client, Database,
};
use rocket::futures::TryStreamExt;
use serde::de::DeserializeOwned;

use crate::{
    error::{Error, Result},
    model::{
        common::{AnswerId, QuestionId, QuestionnaireId, ResponseId, UserId},
        db::{
            AnswerOption, NewAnswerOption, NewQuestion, NewQuestionnaire, NewUser,
            NewUserResponse, Question, Questionnaire, User, UserResponse,
        },
        mongodb::{id_filter, is_duplicate_key_error, Coll, Counter, MongoCollection},
    },
    rules::validation::AnswerError,
};

use super::{
    normalize_choices, AnswerOptionRepo, QuestionRepo, QuestionnaireRepo, ResponseRepo, UserRepo,
};

/// Storage in a MongoDB database, one collection per record type.
///
/// Cascading deletes run inside a transaction, which needs a replica set.
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub fn new(client: Client, db: Database) -> Self {
        Self { client, db }
    }

    fn coll<T: MongoCollection>(&self) -> Coll<T> {
        Coll::from_db(&self.db)
    }

    async fn next_id<T: MongoCollection>(&self) -> Result<u32> {
        Counter::next_id::<T>(&self.coll()).await
    }

    /// Find all matching records, in ID order.
    async fn find_all<T>(&self, filter: impl Into<Option<Document>>) -> Result<Vec<T>>
    where
        T: MongoCollection + DeserializeOwned + Unpin + Send + Sync,
    {
        let options = FindOptions::builder().sort(doc! {"_id": 1}).build();
        Ok(self
            .coll::<T>()
            .find(filter, options)
            .await?
            .try_collect()
            .await?)
    }

    async fn find_by_id<T>(&self, id: u32) -> Result<Option<T>>
    where
        T: MongoCollection + DeserializeOwned + Unpin + Send + Sync,
    {
        Ok(self.coll::<T>().find_one(id_filter(id), None).await?)
    }

    /// Find questionnaires in listing order: latest start date first, and
    /// MongoDB sorts missing dates below any date.
    async fn find_questionnaires(&self, filter: Option<Document>) -> Result<Vec<Questionnaire>> {
        let options = FindOptions::builder()
            .sort(doc! {"date_start": -1, "_id": 1})
            .build();
        Ok(self
            .coll::<Questionnaire>()
            .find(filter, options)
            .await?
            .try_collect()
            .await?)
    }
}

#[rocket::async_trait]
impl QuestionnaireRepo for MongoStore {
    async fn questionnaires(&self) -> Result<Vec<Questionnaire>> {
        self.find_questionnaires(None).await
    }

    async fn active_questionnaires(&self, day: NaiveDate) -> Result<Vec<Questionnaire>> {
        // Dates are stored as `YYYY-MM-DD` strings, which sort like dates.
        // Comparison operators never match a null against a string.
        let day = day.to_string();
        let filter = doc! {
            "date_start": { "$lte": &day },
            "date_stop": { "$gte": &day },
        };
        self.find_questionnaires(Some(filter)).await
    }

    async fn questionnaire(&self, id: QuestionnaireId) -> Result<Option<Questionnaire>> {
        self.find_by_id(id).await
    }

    async fn insert_questionnaire(
        &self,
        questionnaire: NewQuestionnaire,
    ) -> Result<Questionnaire> {
        let id = self.next_id::<Questionnaire>().await?;
        let questionnaire = Questionnaire { id, questionnaire };
        self.coll::<Questionnaire>()
            .insert_one(&questionnaire, None)
            .await?;
        Ok(questionnaire)
    }

    async fn replace_questionnaire(&self, questionnaire: &Questionnaire) -> Result<()> {
        let result = self
            .coll::<NewQuestionnaire>()
            .replace_one(id_filter(questionnaire.id), &questionnaire.questionnaire, None)
            .await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("Questionnaire {}", questionnaire.id)));
        }
        Ok(())
    }

    async fn delete_questionnaire(&self, id: QuestionnaireId) -> Result<bool> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        let deleted = self
            .coll::<Questionnaire>()
            .delete_one_with_session(id_filter(id), None, &mut session)
            .await?
            .deleted_count;
        if deleted == 0 {
            session.abort_transaction().await?;
            return Ok(false);
        }

        // Collect the questions, then remove everything hanging off them.
        let with_questionnaire = doc! {"questionnaire_id": id};
        let questions = self
            .coll::<Question>()
            .distinct_with_session("_id", with_questionnaire.clone(), None, &mut session)
            .await?;
        let with_question = doc! {"question_id": {"$in": questions}};
        self.coll::<AnswerOption>()
            .delete_many_with_session(with_question.clone(), None, &mut session)
            .await?;
        self.coll::<UserResponse>()
            .delete_many_with_session(with_question, None, &mut session)
            .await?;
        self.coll::<Question>()
            .delete_many_with_session(with_questionnaire, None, &mut session)
            .await?;

        session.commit_transaction().await?;
        Ok(true)
    }
}

#[rocket::async_trait]
impl QuestionRepo for MongoStore {
    async fn questions(&self) -> Result<Vec<Question>> {
        self.find_all(None).await
    }

    async fn questions_for(&self, questionnaire_id: QuestionnaireId) -> Result<Vec<Question>> {
        self.find_all(doc! {"questionnaire_id": questionnaire_id})
            .await
    }

    async fn question(&self, id: QuestionId) -> Result<Option<Question>> {
        self.find_by_id(id).await
    }

    async fn insert_question(&self, question: NewQuestion) -> Result<Question> {
        let id = self.next_id::<Question>().await?;
        let question = Question { id, question };
        self.coll::<Question>().insert_one(&question, None).await?;
        Ok(question)
    }

    async fn replace_question(&self, question: &Question) -> Result<()> {
        let result = self
            .coll::<NewQuestion>()
            .replace_one(id_filter(question.id), &question.question, None)
            .await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("Question {}", question.id)));
        }
        Ok(())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        let deleted = self
            .coll::<Question>()
            .delete_one_with_session(id_filter(id), None, &mut session)
            .await?
            .deleted_count;
        if deleted == 0 {
            session.abort_transaction().await?;
            return Ok(false);
        }

        let with_question = doc! {"question_id": id};
        self.coll::<AnswerOption>()
            .delete_many_with_session(with_question.clone(), None, &mut session)
            .await?;
        self.coll::<UserResponse>()
            .delete_many_with_session(with_question, None, &mut session)
            .await?;

        session.commit_transaction().await?;
        Ok(true)
    }
}

#[rocket::async_trait]
impl AnswerOptionRepo for MongoStore {
    async fn answer_options(&self) -> Result<Vec<AnswerOption>> {
        self.find_all(None).await
    }

    async fn answer_options_for(&self, question_id: QuestionId) -> Result<Vec<AnswerOption>> {
        self.find_all(doc! {"question_id": question_id}).await
    }

    async fn answer_option(&self, id: AnswerId) -> Result<Option<AnswerOption>> {
        self.find_by_id(id).await
    }

    async fn insert_answer_option(&self, option: NewAnswerOption) -> Result<AnswerOption> {
        let id = self.next_id::<AnswerOption>().await?;
        let option = AnswerOption { id, option };
        self.coll::<AnswerOption>().insert_one(&option, None).await?;
        Ok(option)
    }

    async fn replace_answer_option(&self, option: &AnswerOption) -> Result<()> {
        let result = self
            .coll::<NewAnswerOption>()
            .replace_one(id_filter(option.id), &option.option, None)
            .await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("Answer {}", option.id)));
        }
        Ok(())
    }

    async fn delete_answer_option(&self, id: AnswerId) -> Result<bool> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        let deleted = self
            .coll::<AnswerOption>()
            .delete_one_with_session(id_filter(id), None, &mut session)
            .await?
            .deleted_count;
        if deleted == 0 {
            session.abort_transaction().await?;
            return Ok(false);
        }

        self.coll::<UserResponse>()
            .update_many_with_session(
                doc! {"choice_answer": id},
                doc! {"$pull": {"choice_answer": id}},
                None,
                &mut session,
            )
            .await?;

        session.commit_transaction().await?;
        Ok(true)
    }
}

#[rocket::async_trait]
impl ResponseRepo for MongoStore {
    async fn responses(&self) -> Result<Vec<UserResponse>> {
        self.find_all(None).await
    }

    async fn response(&self, id: ResponseId) -> Result<Option<UserResponse>> {
        self.find_by_id(id).await
    }

    async fn responses_for_user(&self, user_id: UserId) -> Result<Vec<UserResponse>> {
        self.find_all(doc! {"user_id": user_id}).await
    }

    async fn has_response(&self, user_id: UserId, question_id: QuestionId) -> Result<bool> {
        let count = self
            .coll::<UserResponse>()
            .count_documents(doc! {"user_id": user_id, "question_id": question_id}, None)
            .await?;
        Ok(count > 0)
    }

    async fn insert_response(&self, mut response: NewUserResponse) -> Result<UserResponse> {
        normalize_choices(&mut response.choice_answer);
        let id = self.next_id::<UserResponse>().await?;
        let response = UserResponse { id, response };
        match self
            .coll::<UserResponse>()
            .insert_one(&response, None)
            .await
        {
            Ok(_) => Ok(response),
            Err(e) if is_duplicate_key_error(&e) => Err(AnswerError::AlreadyAnswered.into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_response(&self, id: ResponseId) -> Result<bool> {
        let result = self
            .coll::<UserResponse>()
            .delete_one(id_filter(id), None)
            .await?;
        Ok(result.deleted_count > 0)
    }
}

#[rocket::async_trait]
impl UserRepo for MongoStore {
    async fn user(&self, id: UserId) -> Result<Option<User>> {
        self.find_by_id(id).await
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .coll::<User>()
            .find_one(doc! {"email": email}, None)
            .await?)
    }

    async fn staff(&self) -> Result<Vec<User>> {
        self.find_all(doc! {"is_staff": true}).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let id = self.next_id::<User>().await?;
        let user = User { id, user };
        match self.coll::<User>().insert_one(&user, None).await {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key_error(&e) => Err(Error::bad_request(format!(
                "Username or email already in use: {}",
                user.username
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
