#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use config::{ConfigFairing, StorageFairing};
use logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod rules;

pub use config::Config;

/// Path prefix of every route.
pub const API_BASE: &str = "/api";

pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(StorageFairing)
        .mount(API_BASE, api::routes())
        .register(API_BASE, error::catchers())
}

/// A rocket over the given store and config, skipping the ignition
/// fairings.
#[cfg(test)]
pub(crate) fn rocket_for_store(store: model::store::Store, config: Config) -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .manage(store)
        .manage(config)
        .mount(API_BASE, api::routes())
        .register(API_BASE, error::catchers())
}
