mod validation_errors;

pub use validation_errors::*;
