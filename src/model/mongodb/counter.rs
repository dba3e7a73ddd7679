use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::{Coll, MongoCollection};

/// A counter object used to implement auto-increment fields. There is one
/// counter per collection, named after it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: u32,
}

impl Counter {
    /// Atomically allocate the next ID for records of type `T`.
    ///
    /// Counters are created on first use, so the first ID handed out is 1.
    pub async fn next_id<T: MongoCollection>(counters: &Coll<Counter>) -> Result<u32> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": T::NAME }, update, options)
            .await?
            .ok_or_else(|| {
                Error::Status(
                    Status::InternalServerError,
                    format!("Failed to find counter for {}", T::NAME),
                )
            })?;
        Ok(counter.next)
    }
}
