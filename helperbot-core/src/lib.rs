pub mod config;
pub mod error;
pub mod error_utils;
pub mod gate;
pub mod matcher;
pub mod scoring;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use gate::*;
pub use matcher::*;
pub use scoring::*;
pub use traits::*;
pub use types::*;
