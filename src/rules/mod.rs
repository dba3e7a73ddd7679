//! Business rules for editing surveys and accepting answers.
//!
//! Everything here except [`aggregate::responses_for_user`] is a pure function
//! over plain records, so the rules can be checked without any storage.

pub mod aggregate;
pub mod mutability;
pub mod validation;
