pub mod cache;
pub mod config;
pub mod error;
pub mod text;
pub mod traits;
pub mod types;

pub use cache::ResultCache;
pub use config::Config;
pub use error::{VerificationError, VerityError};
pub use text::*;
pub use traits::*;
pub use types::*;
