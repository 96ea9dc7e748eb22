pub mod browser;
pub mod catalog;
pub mod content;
pub mod login;
pub mod metadata;
pub mod models;

pub use browser::{FetchError, Session};
