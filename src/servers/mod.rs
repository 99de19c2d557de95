pub mod http;

pub use http::{ApiConfig, ApiServer};
