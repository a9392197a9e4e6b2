pub mod competitions;
pub mod ratings;
