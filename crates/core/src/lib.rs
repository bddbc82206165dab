pub mod config;
pub mod error;
pub mod taxonomy;
pub mod types;

pub use config::AppConfig;
pub use error::{DealflowError, DealflowResult};
pub use taxonomy::Taxonomy;
