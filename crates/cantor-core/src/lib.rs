pub mod config;
pub mod error;
pub mod types;

pub use config::CantorConfig;
pub use error::{CantorError, Result};
pub use types::*;
