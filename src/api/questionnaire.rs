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
            question::QuestionDescription,
            questionnaire::{QuestionnaireDescription, QuestionnairePatch, QuestionnaireSpec},
        },
        common::{today, QuestionnaireId},
        db::{NewQuestionnaire, Questionnaire},
        store::{QuestionRepo, QuestionnaireRepo, Store},
    },
};

use super::created;

pub fn routes() -> Vec<Route> {
    routes![
        get_questionnaires,
        get_active_questionnaires,
        get_questionnaire,
        get_questionnaire_questions,
        create_questionnaire,
        replace_questionnaire,
        patch_questionnaire,
        delete_questionnaire,
    ]
}

async fn find(store: &Store, id: QuestionnaireId) -> Result<Questionnaire> {
    store
        .questionnaire(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Questionnaire {id}")))
}

#[get("/questionnaire")]
async fn get_questionnaires(store: Store) -> Result<Json<Vec<QuestionnaireDescription>>> {
    let day = today();
    let questionnaires = store
        .questionnaires()
        .await?
        .into_iter()
        .map(|questionnaire| QuestionnaireDescription::new(questionnaire, day))
        .collect();
    Ok(Json(questionnaires))
}

#[get("/questionnaire/active")]
async fn get_active_questionnaires(
    store: Store,
) -> Result<Json<Vec<QuestionnaireDescription>>> {
    let day = today();
    let questionnaires = store
        .active_questionnaires(day)
        .await?
        .into_iter()
        .map(|questionnaire| QuestionnaireDescription::new(questionnaire, day))
        .collect();
    Ok(Json(questionnaires))
}

#[get("/questionnaire/<questionnaire_id>")]
async fn get_questionnaire(
    questionnaire_id: QuestionnaireId,
    store: Store,
) -> Result<Json<QuestionnaireDescription>> {
    Ok(Json(find(&store, questionnaire_id).await?.into()))
}

#[get("/questionnaire/<questionnaire_id>/questions")]
async fn get_questionnaire_questions(
    questionnaire_id: QuestionnaireId,
    store: Store,
) -> Result<Json<Vec<QuestionDescription>>> {
    find(&store, questionnaire_id).await?;
    let questions = store
        .questions_for(questionnaire_id)
        .await?
        .into_iter()
        .map(QuestionDescription::from)
        .collect();
    Ok(Json(questions))
}

#[post("/questionnaire", data = "<spec>", format = "json")]
async fn create_questionnaire(
    _token: AuthToken<Staff>,
    spec: Json<QuestionnaireSpec>,
    store: Store,
) -> Result<Created<Json<QuestionnaireDescription>>> {
    let questionnaire: NewQuestionnaire = spec.0.try_into()?;
    let questionnaire = store.insert_questionnaire(questionnaire).await?;
    info!("Created questionnaire {}", questionnaire.id);
    Ok(created(
        format!("/questionnaire/{}", questionnaire.id),
        questionnaire.into(),
    ))
}

// The questionnaire itself stays editable after it starts; only its questions
// and answer options are frozen.
#[put("/questionnaire/<questionnaire_id>", data = "<spec>", format = "json")]
async fn replace_questionnaire(
    _token: AuthToken<Staff>,
    questionnaire_id: QuestionnaireId,
    spec: Json<QuestionnaireSpec>,
    store: Store,
) -> Result<Json<QuestionnaireDescription>> {
    let mut questionnaire = find(&store, questionnaire_id).await?;
    questionnaire.questionnaire = spec.0.try_into()?;
    store.replace_questionnaire(&questionnaire).await?;
    Ok(Json(questionnaire.into()))
}

#[patch("/questionnaire/<questionnaire_id>", data = "<patch>", format = "json")]
async fn patch_questionnaire(
    _token: AuthToken<Staff>,
    questionnaire_id: QuestionnaireId,
    patch: Json<QuestionnairePatch>,
    store: Store,
) -> Result<Json<QuestionnaireDescription>> {
    let mut questionnaire = find(&store, questionnaire_id).await?;
    patch.0.apply(&mut questionnaire)?;
    store.replace_questionnaire(&questionnaire).await?;
    Ok(Json(questionnaire.into()))
}

#[delete("/questionnaire/<questionnaire_id>")]
async fn delete_questionnaire(
    _token: AuthToken<Staff>,
    questionnaire_id: QuestionnaireId,
    store: Store,
) -> Result<NoContent> {
    if store.delete_questionnaire(questionnaire_id).await? {
        info!("Deleted questionnaire {questionnaire_id}");
        Ok(NoContent)
    } else {
        Err(Error::not_found(format!("Questionnaire {questionnaire_id}")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::Client,
        serde::json::{json, serde_json},
    };

    use super::*;
    use crate::model::{
        db::{AnswerOptionCore, QuestionCore, UserResponseCore},
        store::{AnswerOptionRepo, ResponseRepo},
    };

    #[backend_test(staff)]
    async fn create_get_update(client: Client, auth: Header<'static>) {
        let response = client
            .post("/api/questionnaire")
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!(QuestionnaireSpec::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        assert_eq!(
            Some("/api/questionnaire/1"),
            response.headers().get_one("Location")
        );
        let created: QuestionnaireDescription = response.into_json().await.unwrap();
        assert_eq!(created.title, "Weather");
        assert!(!created.is_active);

        let response = client.get("/api/questionnaire/1").dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let fetched: QuestionnaireDescription = response.into_json().await.unwrap();
        assert_eq!(fetched, created);

        // Start it today: the questionnaire itself remains editable.
        let today = today();
        let response = client
            .patch("/api/questionnaire/1")
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!({"date_start": today, "date_stop": today}).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let patched: QuestionnaireDescription = response.into_json().await.unwrap();
        assert!(patched.is_active);
        assert_eq!(patched.title, "Weather");

        let response = client
            .put("/api/questionnaire/1")
            .header(ContentType::JSON)
            .header(auth)
            .body(json!(QuestionnaireSpec::example2()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let replaced: QuestionnaireDescription = response.into_json().await.unwrap();
        assert_eq!(replaced.title, "Clothes");
        assert_eq!(replaced.date_start, None);
    }

    #[backend_test(staff)]
    async fn list_and_active(client: Client, store: Store, auth: Header<'static>) {
        let today = today();
        let mut running = NewQuestionnaire::example();
        running.date_start = Some(today - Duration::days(1));
        running.date_stop = Some(today + Duration::days(1));
        let mut finished = NewQuestionnaire::example2();
        finished.date_start = Some(today - Duration::days(10));
        finished.date_stop = Some(today - Duration::days(5));

        let draft = store
            .insert_questionnaire(NewQuestionnaire::example())
            .await
            .unwrap();
        let finished = store.insert_questionnaire(finished).await.unwrap();
        let running = store.insert_questionnaire(running).await.unwrap();

        let response = client.get("/api/questionnaire").dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let all: Vec<QuestionnaireDescription> = response.into_json().await.unwrap();
        let ids: Vec<_> = all.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![running.id, finished.id, draft.id]);

        let response = client.get("/api/questionnaire/active").dispatch().await;
        let active: Vec<QuestionnaireDescription> = response.into_json().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, running.id);
        assert!(active[0].is_active);

        // Reads need no token, writes do.
        let response = client
            .delete(format!("/api/questionnaire/{}", draft.id))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
        let response = client
            .delete(format!("/api/questionnaire/{}", draft.id))
            .header(auth)
            .dispatch()
            .await;
        assert_eq!(Status::NoContent, response.status());
    }

    #[backend_test(staff)]
    async fn bad_questionnaires(client: Client, auth: Header<'static>) {
        let mut spec = QuestionnaireSpec::example();
        spec.title = "x".repeat(51);
        let response = client
            .post("/api/questionnaire")
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(
            body["message"],
            "Questionnaire title must be at most 50 characters."
        );

        let response = client
            .post("/api/questionnaire")
            .header(ContentType::JSON)
            .header(auth.clone())
            .body("{not json")
            .dispatch()
            .await;
        assert!(response.status().class().is_client_error());
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert!(body["detail"].is_string());

        let response = client.get("/api/questionnaire/42").dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["message"], "Questionnaire 42 not found");

        let response = client
            .delete("/api/questionnaire/42")
            .header(auth)
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(user)]
    async fn members_cannot_create(client: Client, auth: Header<'static>) {
        let response = client
            .post("/api/questionnaire")
            .header(ContentType::JSON)
            .header(auth)
            .body(json!(QuestionnaireSpec::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
    }

    #[backend_test(staff)]
    async fn delete_cascades(client: Client, store: Store, auth: Header<'static>) {
        let questionnaire = store
            .insert_questionnaire(NewQuestionnaire::example())
            .await
            .unwrap();
        let question = store
            .insert_question(QuestionCore::single_choice_example(questionnaire.id))
            .await
            .unwrap();
        let option = store
            .insert_answer_option(AnswerOptionCore::example(question.id))
            .await
            .unwrap();
        store
            .insert_response(UserResponseCore::choice_example(
                1,
                question.id,
                vec![option.id],
            ))
            .await
            .unwrap();

        let response = client
            .get(format!("/api/questionnaire/{}/questions", questionnaire.id))
            .dispatch()
            .await;
        let questions: Vec<QuestionDescription> = response.into_json().await.unwrap();
        assert_eq!(questions, vec![QuestionDescription::from(question)]);

        let response = client
            .delete(format!("/api/questionnaire/{}", questionnaire.id))
            .header(auth)
            .dispatch()
            .await;
        assert_eq!(Status::NoContent, response.status());

        assert!(store.questions().await.unwrap().is_empty());
        assert!(store.answer_options().await.unwrap().is_empty());
        assert!(store.responses().await.unwrap().is_empty());
    }
}
