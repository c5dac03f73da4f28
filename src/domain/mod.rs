pub mod errors;
pub mod models;

// Re-export commonly used types
pub use errors::ValidationError;
pub use models::*;
