//! Port adapters.

mod reqwest_client;

pub use reqwest_client::{JSON_CONTENT_TYPE, ReqwestHttpClient};
