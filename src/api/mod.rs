use rocket::{response::status::Created, serde::json::Json, Route};

use crate::API_BASE;

pub mod answer;
pub mod auth;
pub mod question;
pub mod questionnaire;
pub mod response;
pub mod staff;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(staff::routes());
    routes.extend(questionnaire::routes());
    routes.extend(question::routes());
    routes.extend(answer::routes());
    routes.extend(response::routes());
    routes
}

/// A 201 response for a new resource living at `path` under the API base.
fn created<T>(path: impl AsRef<str>, body: T) -> Created<Json<T>> {
    Created::new(format!("{API_BASE}{}", path.as_ref())).body(Json(body))
}
