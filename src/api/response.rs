use rocket::{
    response::status::{Created, NoContent},
    serde::json::Json,
    Route,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::{AuthToken, Staff},
            response::{ResponseDescription, ResponseSpec, MAX_TEXT_ANSWER_LENGTH},
        },
        common::{ResponseId, UserId},
        db::NewUserResponse,
        store::{AnswerOptionRepo, ResponseRepo, Store},
    },
    rules::{
        aggregate::{self, UserResponses},
        mutability::require,
        validation::validate,
    },
};

use super::{created, question};

pub fn routes() -> Vec<Route> {
    routes![
        get_responses,
        get_response,
        create_response,
        delete_response,
        get_user_responses,
    ]
}

#[get("/answer_user")]
async fn get_responses(store: Store) -> Result<Json<Vec<ResponseDescription>>> {
    let responses = store
        .responses()
        .await?
        .into_iter()
        .map(ResponseDescription::from)
        .collect();
    Ok(Json(responses))
}

#[get("/answer_user/<response_id>")]
async fn get_response(
    response_id: ResponseId,
    store: Store,
) -> Result<Json<ResponseDescription>> {
    let response = store
        .response(response_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Response {response_id}")))?;
    Ok(Json(response.into()))
}

/// Submit a response. Open to anyone; the answering user is named in the
/// payload.
#[post("/answer_user", data = "<spec>", format = "json")]
async fn create_response(
    spec: Json<ResponseSpec>,
    store: Store,
) -> Result<Created<Json<ResponseDescription>>> {
    let spec = spec.0;
    let question_id = require(spec.question, "question")?;
    let question = question::find(&store, question_id).await?;
    let text_answer = spec.text_answer.unwrap_or_default();

    let already_answered = match spec.user_id {
        Some(user_id) => store.has_response(user_id, question_id).await?,
        None => false,
    };
    validate(
        question.question_type,
        already_answered,
        &text_answer,
        &spec.choice_answer,
    )?;
    let user_id = spec
        .user_id
        .ok_or_else(|| Error::bad_request("No 'user_id' specified."))?;

    if text_answer.chars().count() > MAX_TEXT_ANSWER_LENGTH {
        return Err(Error::bad_request(format!(
            "The answer must be at most {MAX_TEXT_ANSWER_LENGTH} characters."
        )));
    }
    for choice in &spec.choice_answer {
        let belongs = store
            .answer_option(*choice)
            .await?
            .map_or(false, |option| option.question_id == question_id);
        if !belongs {
            return Err(Error::bad_request(format!(
                "Answer {choice} is not an option of question {question_id}."
            )));
        }
    }

    let response = store
        .insert_response(NewUserResponse {
            user_id,
            question_id,
            text_answer,
            choice_answer: spec.choice_answer,
        })
        .await?;
    info!(
        "Stored response {} by user {user_id} to question {question_id}",
        response.id
    );
    Ok(created(
        format!("/answer_user/{}", response.id),
        response.into(),
    ))
}

#[delete("/answer_user/<response_id>")]
async fn delete_response(
    _token: AuthToken<Staff>,
    response_id: ResponseId,
    store: Store,
) -> Result<NoContent> {
    if store.delete_response(response_id).await? {
        info!("Deleted response {response_id}");
        Ok(NoContent)
    } else {
        Err(Error::not_found(format!("Response {response_id}")))
    }
}

#[get("/get_user_responses/<user_id>")]
async fn get_user_responses(user_id: UserId, store: Store) -> Result<Json<UserResponses>> {
    Ok(Json(aggregate::responses_for_user(&store, user_id).await?))
}
