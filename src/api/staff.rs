use rocket::{response::status::Created, serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::{
            auth::{AuthToken, Staff},
            user::{Registration, UserDescription},
        },
        db::NewUser,
        store::{Store, UserRepo},
    },
};

use super::created;

pub fn routes() -> Vec<Route> {
    routes![get_staff, create_staff]
}

#[get("/staff")]
async fn get_staff(_token: AuthToken<Staff>, store: Store) -> Result<Json<Vec<String>>> {
    let usernames = store
        .staff()
        .await?
        .into_iter()
        .map(|user| user.user.username)
        .collect();
    Ok(Json(usernames))
}

#[post("/staff", data = "<registration>", format = "json")]
async fn create_staff(
    token: AuthToken<Staff>,
    registration: Json<Registration>,
    store: Store,
) -> Result<Created<Json<UserDescription>>> {
    let mut user: NewUser = registration.0.try_into()?;
    user.is_staff = true;
    let user = store.insert_user(user).await?;
    info!(
        "Staff account {} created by {}",
        user.username, token.user.username
    );
    Ok(created("/staff", user.into()))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::Client,
        serde::json::{json, serde_json},
    };

    use super::*;
    use crate::Config;

    #[backend_test(staff)]
    async fn create_and_list_staff(client: Client, store: Store, auth: Header<'static>) {
        let response = client
            .post("/api/staff")
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!(Registration::example2()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        let created: UserDescription = response.into_json().await.unwrap();
        assert!(created.is_staff);
        assert_eq!(created.token, None);
        assert!(store.user(created.id).await.unwrap().unwrap().is_staff);

        let response = client.get("/api/staff").header(auth).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let staff: Vec<String> = response.into_json().await.unwrap();
        assert_eq!(
            staff,
            vec![
                Config::example().admin_username().to_string(),
                Registration::example_staff().username,
                Registration::example2().username,
            ]
        );
    }

    #[backend_test(user)]
    async fn members_cannot_see_staff(client: Client, auth: Header<'static>) {
        let response = client.get("/api/staff").header(auth).dispatch().await;
        assert_eq!(Status::Forbidden, response.status());
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(
            body["detail"],
            "You do not have permission to perform this action."
        );
    }
}
