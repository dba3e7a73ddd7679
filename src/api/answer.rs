use rocket::{
    response::status::{Created, NoContent},
    serde::json::Json,
    Route,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            answer::{AnswerDescription, AnswerPatch, AnswerSpec},
            auth::{AuthToken, Staff},
        },
        common::AnswerId,
        db::AnswerOption,
        store::{AnswerOptionRepo, Store},
    },
    rules::mutability::{ensure_accepts_options, ensure_mutable, require, Operation, Resource},
};

use super::{created, question};

pub fn routes() -> Vec<Route> {
    routes![
        get_answers,
        get_answer,
        create_answer,
        replace_answer,
        patch_answer,
        delete_answer,
    ]
}

async fn find(store: &Store, id: AnswerId) -> Result<AnswerOption> {
    store
        .answer_option(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Answer {id}")))
}

/// Look up an answer option and refuse `operation` once the questionnaire it
/// ultimately belongs to has started.
async fn find_mutable(store: &Store, id: AnswerId, operation: Operation) -> Result<AnswerOption> {
    let option = find(store, id).await?;
    let question = question::find(store, option.question_id).await?;
    let questionnaire = question::owner(store, &question).await?;
    ensure_mutable(&questionnaire, Resource::Answer, operation)?;
    Ok(option)
}

#[get("/answer")]
async fn get_answers(store: Store) -> Result<Json<Vec<AnswerDescription>>> {
    let options = store
        .answer_options()
        .await?
        .into_iter()
        .map(AnswerDescription::from)
        .collect();
    Ok(Json(options))
}

#[get("/answer/<answer_id>")]
async fn get_answer(answer_id: AnswerId, store: Store) -> Result<Json<AnswerDescription>> {
    Ok(Json(find(&store, answer_id).await?.into()))
}

#[post("/answer", data = "<spec>", format = "json")]
async fn create_answer(
    _token: AuthToken<Staff>,
    spec: Json<AnswerSpec>,
    store: Store,
) -> Result<Created<Json<AnswerDescription>>> {
    let spec = spec.0;
    let question_id = require(spec.question_id, "question_id")?;
    let question = question::find(&store, question_id).await?;
    let questionnaire = question::owner(&store, &question).await?;
    ensure_mutable(&questionnaire, Resource::Answer, Operation::Create)?;
    ensure_accepts_options(question.question_type)?;

    let option = store
        .insert_answer_option(spec.into_new(question_id)?)
        .await?;
    info!("Created answer {} for question {question_id}", option.id);
    Ok(created(format!("/answer/{}", option.id), option.into()))
}

#[put("/answer/<answer_id>", data = "<spec>", format = "json")]
async fn replace_answer(
    _token: AuthToken<Staff>,
    answer_id: AnswerId,
    spec: Json<AnswerSpec>,
    store: Store,
) -> Result<Json<AnswerDescription>> {
    let mut option = find_mutable(&store, answer_id, Operation::Update).await?;
    spec.0.apply(&mut option)?;
    store.replace_answer_option(&option).await?;
    Ok(Json(option.into()))
}

#[patch("/answer/<answer_id>", data = "<patch>", format = "json")]
async fn patch_answer(
    _token: AuthToken<Staff>,
    answer_id: AnswerId,
    patch: Json<AnswerPatch>,
    store: Store,
) -> Result<Json<AnswerDescription>> {
    let mut option = find_mutable(&store, answer_id, Operation::Update).await?;
    patch.0.apply(&mut option)?;
    store.replace_answer_option(&option).await?;
    Ok(Json(option.into()))
}

#[delete("/answer/<answer_id>")]
async fn delete_answer(
    _token: AuthToken<Staff>,
    answer_id: AnswerId,
    store: Store,
) -> Result<NoContent> {
    find_mutable(&store, answer_id, Operation::Delete).await?;
    if store.delete_answer_option(answer_id).await? {
        info!("Deleted answer {answer_id}");
        Ok(NoContent)
    } else {
        Err(Error::not_found(format!("Answer {answer_id}")))
    }
}
