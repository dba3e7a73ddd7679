mod collection;
mod counter;
mod errors;

use mongodb::bson::{doc, Document};

pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use counter::Counter;
pub use errors::is_duplicate_key_error;

/// A filter matching the document with the given integer ID.
pub fn id_filter(id: u32) -> Document {
    doc! { "_id": id }
}
