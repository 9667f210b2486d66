//! Extensions shipped with the engine.

mod disable_validation;
mod logger;
mod timing;

pub use disable_validation::DisableValidation;
pub use logger::RequestLogger;
pub use timing::Timing;
