// Models module
// Domain models and request/response types for the REST API

pub mod history;
pub mod language;
pub mod user;
pub mod user_word;
pub mod word;
