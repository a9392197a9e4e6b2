pub mod evaluate_rating;
pub mod generate_rating;

pub use evaluate_rating::EvaluateRating;
pub use generate_rating::{GenerateRating, GenerateRatingInput, RatingOutcome};
