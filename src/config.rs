use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{db::user::ensure_staff_exists, mongodb::ensure_indexes_exist, store::Store};

/// Where records are kept.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Mongodb,
    /// Process memory. Everything is lost on shutdown.
    Memory,
}

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    admin_username: String,
    admin_email: String,
    #[serde(default)]
    storage: StorageKind,
    // secrets
    jwt_secret: String,
    admin_password: String,
}

impl Config {
    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Username of the staff account created on first launch.
    pub fn admin_username(&self) -> &str {
        &self.admin_username
    }

    /// Email of the staff account created on first launch.
    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    /// Password of the staff account created on first launch.
    pub fn admin_password(&self) -> &str {
        &self.admin_password
    }

    pub fn storage(&self) -> StorageKind {
        self.storage
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
pub(crate) struct DbConfig {
    // secrets
    pub(crate) db_uri: String,
}

/// A fairing that opens the configured storage, performs any setup
/// necessary, and places a [`Store`] into managed state.
///
/// Must be attached after [`ConfigFairing`].
pub struct StorageFairing;

#[rocket::async_trait]
impl Fairing for StorageFairing {
    fn info(&self) -> Info {
        Info {
            name: "Storage",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let kind = match rocket.state::<Config>() {
            Some(config) => config.storage(),
            None => {
                error!("Storage requires the application config to be loaded first");
                return Err(rocket);
            }
        };

        let store = match kind {
            StorageKind::Memory => {
                warn!("Using in-memory storage, nothing will be persisted");
                Store::memory()
            }
            StorageKind::Mongodb => match connect(&rocket).await {
                Some(store) => store,
                None => return Err(rocket),
            },
        };

        // Ensure there is at least one staff account.
        let bootstrapped = match rocket.state::<Config>() {
            Some(config) => ensure_staff_exists(&store, config).await,
            None => Ok(()),
        };
        if let Err(e) = bootstrapped {
            error!("Failed to create the initial staff account: {e}");
            return Err(rocket);
        }

        // Manage the state.
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}

/// Load the MongoDB config, connect to the database and ensure the required
/// indexes exist.
async fn connect(rocket: &Rocket<Build>) -> Option<Store> {
    // Load the config.
    let config = match rocket.figment().extract::<DbConfig>() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load database config");
            rocket::config::pretty_print_error(e);
            return None;
        }
    };
    info!("Loaded database config, connecting...");
    // Construct the connection.
    let client = match MongoClient::with_uri_str(config.db_uri).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to database: {e}");
            return None;
        }
    };
    let db = client.database(&get_database_name());

    // Ensure the required indexes exist.
    if let Err(e) = ensure_indexes_exist(&db).await {
        error!("Failed to connect to database: {e}");
        return None;
    }
    info!("...database connection online!");

    Some(Store::mongodb(client, db))
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
pub(crate) fn get_database_name() -> String {
    "questionnaire".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
pub(crate) fn get_database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Config {
        pub fn example() -> Self {
            Self {
                admin_username: "admin".to_string(),
                admin_email: "admin@example.com".to_string(),
                storage: StorageKind::Memory,
                jwt_secret: "test-secret-that-is-long-enough".to_string(),
                admin_password: "password123".to_string(),
            }
        }
    }
}
