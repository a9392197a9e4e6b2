pub mod enumerator;
pub mod error;
pub mod export;
pub mod generator;
pub mod jobs;
pub mod observer;
pub mod scheduler;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{FailureClass, RaterError, Result};
