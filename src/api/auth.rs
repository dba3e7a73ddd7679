use rocket::{http::Status, response::status::Created, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::{issue_token, AuthToken, Member},
            user::{normalize_email, LoginCredentials, Registration, UserDescription},
        },
        db::NewUser,
        store::{Store, UserRepo},
    },
    Config,
};

use super::created;

pub fn routes() -> Vec<Route> {
    routes![register, login, current_user]
}

#[post("/users", data = "<registration>", format = "json")]
async fn register(
    registration: Json<Registration>,
    store: Store,
    config: &State<Config>,
) -> Result<Created<Json<UserDescription>>> {
    let user: NewUser = registration.0.try_into()?;
    let user = store.insert_user(user).await?;
    info!("Registered user {} ({})", user.id, user.username);

    let token = issue_token(user.id, config)?;
    Ok(created("/user", UserDescription::with_token(user, token)))
}

#[post("/users/login", data = "<credentials>", format = "json")]
pub async fn login(
    credentials: Json<LoginCredentials>,
    store: Store,
    config: &State<Config>,
) -> Result<Json<UserDescription>> {
    let rejected = || {
        Error::Status(
            Status::Unauthorized,
            "A user with this email and password was not found.".to_string(),
        )
    };

    let email = normalize_email(&credentials.email).ok_or_else(rejected)?;
    let user = store
        .user_by_email(&email)
        .await?
        .filter(|user| user.is_active && user.verify_password(&credentials.password))
        .ok_or_else(rejected)?;

    let token = issue_token(user.id, config)?;
    Ok(Json(UserDescription::with_token(user, token)))
}

#[get("/user")]
async fn current_user(token: AuthToken<Member>) -> Json<UserDescription> {
    Json(token.into_user().into())
}

/// Create an account directly in the store, log it in and return the
/// resulting `Authorization` header.
#[cfg(test)]
pub(crate) async fn login_header(
    client: &rocket::local::asynchronous::Client,
    store: &Store,
    staff: bool,
) -> rocket::http::Header<'static> {
    use rocket::http::ContentType;

    let registration = if staff {
        Registration::example_staff()
    } else {
        Registration::example()
    };
    let mut user: NewUser = registration.clone().try_into().unwrap();
    user.is_staff = staff;
    store.insert_user(user).await.unwrap();

    let credentials = LoginCredentials {
        email: registration.email,
        password: registration.password,
    };
    let response = client
        .post("/api/users/login")
        .header(ContentType::JSON)
        .body(rocket::serde::json::json!(credentials).to_string())
        .dispatch()
        .await;
    assert_eq!(Status::Ok, response.status());
    let description: UserDescription = response.into_json().await.unwrap();
    let token = description.token.unwrap();
    rocket::http::Header::new("Authorization", format!("Bearer {token}"))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Header},
        local::asynchronous::Client,
        serde::json::{json, serde_json},
    };

    use super::*;
    use crate::model::api::auth::{verify_token, Claims};

    #[backend_test]
    async fn register_then_login(client: Client, store: Store) {
        let response = client
            .post("/api/users")
            .header(ContentType::JSON)
            .body(json!(Registration::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        assert_eq!(Some("/api/user"), response.headers().get_one("Location"));
        let registered: UserDescription = response.into_json().await.unwrap();
        assert_eq!(registered.username, "jane");
        assert_eq!(registered.email, "jane@example.com");
        assert!(!registered.is_staff);
        let token = registered.token.unwrap();
        assert_eq!(
            verify_token(&token, &Config::example()).unwrap(),
            registered.id
        );

        // The password is stored hashed.
        let stored = store.user(registered.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, Registration::example().password);

        // Log in with differently cased domain.
        let response = client
            .post("/api/users/login")
            .header(ContentType::JSON)
            .body(json!({"email": "jane@EXAMPLE.com", "password": "sunnyweather"}).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let logged_in: UserDescription = response.into_json().await.unwrap();
        assert_eq!(logged_in.id, registered.id);
        assert!(logged_in.token.is_some());
    }

    #[backend_test]
    async fn bad_login(client: Client) {
        client
            .post("/api/users")
            .header(ContentType::JSON)
            .body(json!(Registration::example()).to_string())
            .dispatch()
            .await;

        for body in [
            json!({"email": "jane@example.com", "password": "wrong password"}),
            json!({"email": "nobody@example.com", "password": "sunnyweather"}),
            json!({"email": "not an email", "password": "sunnyweather"}),
        ] {
            let response = client
                .post("/api/users/login")
                .header(ContentType::JSON)
                .body(body.to_string())
                .dispatch()
                .await;
            assert_eq!(Status::Unauthorized, response.status());
            let body: serde_json::Value = response.into_json().await.unwrap();
            assert_eq!(
                body["message"],
                "A user with this email and password was not found."
            );
        }
    }

    #[backend_test]
    async fn duplicate_registration(client: Client) {
        let register = |registration: Registration| {
            client
                .post("/api/users")
                .header(ContentType::JSON)
                .body(json!(registration).to_string())
                .dispatch()
        };

        assert_eq!(
            Status::Created,
            register(Registration::example()).await.status()
        );

        let mut same_username = Registration::example2();
        same_username.username = Registration::example().username;
        assert_eq!(
            Status::BadRequest,
            register(same_username).await.status()
        );

        let mut same_email = Registration::example2();
        same_email.email = "jane@example.COM".into();
        assert_eq!(Status::BadRequest, register(same_email).await.status());

        let mut short_password = Registration::example2();
        short_password.password = "short".into();
        let response = register(short_password).await;
        assert_eq!(Status::BadRequest, response.status());
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["message"], "Password must be at least 8 characters.");
    }

    #[backend_test(user)]
    async fn current_user_requires_token(client: Client, auth: Header<'static>) {
        let response = client.get("/api/user").header(auth).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let user: UserDescription = response.into_json().await.unwrap();
        assert_eq!(user.username, Registration::example().username);
        assert_eq!(user.token, None);

        let response = client.get("/api/user").dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(
            body["detail"],
            "Authentication credentials were not provided."
        );

        let response = client
            .get("/api/user")
            .header(Header::new("Authorization", "Bearer nonsense"))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["detail"], "Invalid token.");
    }

    #[backend_test]
    async fn expired_token_rejected(client: Client, store: Store) {
        let user: NewUser = Registration::example().try_into().unwrap();
        let user = store.insert_user(user).await.unwrap();
        let claims = Claims {
            id: user.id,
            expire_at: chrono::Utc::now() - chrono::Duration::days(1),
        };
        let token = claims.encode(&Config::example()).unwrap();

        let response = client
            .get("/api/user")
            .header(Header::new("Authorization", format!("Bearer {token}")))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["detail"], "Invalid token.");
    }

    #[backend_test]
    async fn token_for_unknown_user_rejected(client: Client) {
        let token = issue_token(999, &Config::example()).unwrap();
        let response = client
            .get("/api/user")
            .header(Header::new("Authorization", format!("Bearer {token}")))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }
}
