use rocket::{
    response::status::{Created, NoContent},
    serde::json::Json,
    Route,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            answer::AnswerDescription,
            auth::{AuthToken, Staff},
            question::{QuestionDescription, QuestionPatch, QuestionSpec},
        },
        common::QuestionId,
        db::{Question, Questionnaire},
        store::{AnswerOptionRepo, QuestionRepo, QuestionnaireRepo, Store},
    },
    rules::mutability::{ensure_mutable, require, Operation, Resource},
};

use super::created;

pub fn routes() -> Vec<Route> {
    routes![
        get_questions,
        get_question,
        get_question_answers,
        create_question,
        replace_question,
        patch_question,
        delete_question,
    ]
}

pub(super) async fn find(store: &Store, id: QuestionId) -> Result<Question> {
    store
        .question(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Question {id}")))
}

/// The questionnaire a question belongs to.
pub(super) async fn owner(store: &Store, question: &Question) -> Result<Questionnaire> {
    let id = question.questionnaire_id;
    store
        .questionnaire(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Questionnaire {id}")))
}

/// Look up a question and refuse `operation` once its questionnaire started.
async fn find_mutable(store: &Store, id: QuestionId, operation: Operation) -> Result<Question> {
    let question = find(store, id).await?;
    let questionnaire = owner(store, &question).await?;
    ensure_mutable(&questionnaire, Resource::Question, operation)?;
    Ok(question)
}

#[get("/question")]
async fn get_questions(store: Store) -> Result<Json<Vec<QuestionDescription>>> {
    let questions = store
        .questions()
        .await?
        .into_iter()
        .map(QuestionDescription::from)
        .collect();
    Ok(Json(questions))
}

#[get("/question/<question_id>")]
async fn get_question(question_id: QuestionId, store: Store) -> Result<Json<QuestionDescription>> {
    Ok(Json(find(&store, question_id).await?.into()))
}

#[get("/question/<question_id>/answers")]
async fn get_question_answers(
    question_id: QuestionId,
    store: Store,
) -> Result<Json<Vec<AnswerDescription>>> {
    find(&store, question_id).await?;
    let options = store
        .answer_options_for(question_id)
        .await?
        .into_iter()
        .map(AnswerDescription::from)
        .collect();
    Ok(Json(options))
}

#[post("/question", data = "<spec>", format = "json")]
async fn create_question(
    _token: AuthToken<Staff>,
    spec: Json<QuestionSpec>,
    store: Store,
) -> Result<Created<Json<QuestionDescription>>> {
    let spec = spec.0;
    let questionnaire_id = require(spec.questionnaire_id, "questionnaire_id")?;
    let questionnaire = store
        .questionnaire(questionnaire_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Questionnaire {questionnaire_id}")))?;
    ensure_mutable(&questionnaire, Resource::Question, Operation::Create)?;

    let question = store
        .insert_question(spec.into_new(questionnaire_id)?)
        .await?;
    info!(
        "Created question {} ({}) in questionnaire {questionnaire_id}",
        question.id, question.question_type
    );
    Ok(created(
        format!("/question/{}", question.id),
        question.into(),
    ))
}

#[put("/question/<question_id>", data = "<spec>", format = "json")]
async fn replace_question(
    _token: AuthToken<Staff>,
    question_id: QuestionId,
    spec: Json<QuestionSpec>,
    store: Store,
) -> Result<Json<QuestionDescription>> {
    let mut question = find_mutable(&store, question_id, Operation::Update).await?;
    spec.0.apply(&mut question)?;
    store.replace_question(&question).await?;
    Ok(Json(question.into()))
}

#[patch("/question/<question_id>", data = "<patch>", format = "json")]
async fn patch_question(
    _token: AuthToken<Staff>,
    question_id: QuestionId,
    patch: Json<QuestionPatch>,
    store: Store,
) -> Result<Json<QuestionDescription>> {
    let mut question = find_mutable(&store, question_id, Operation::Update).await?;
    patch.0.apply(&mut question)?;
    store.replace_question(&question).await?;
    Ok(Json(question.into()))
}

#[delete("/question/<question_id>")]
async fn delete_question(
    _token: AuthToken<Staff>,
    question_id: QuestionId,
    store: Store,
) -> Result<NoContent> {
    find_mutable(&store, question_id, Operation::Delete).await?;
    if store.delete_question(question_id).await? {
        info!("Deleted question {question_id}");
        Ok(NoContent)
    } else {
        Err(Error::not_found(format!("Question {question_id}")))
    }
}
