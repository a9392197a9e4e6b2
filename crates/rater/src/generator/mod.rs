pub mod ollama;
pub mod ollama_client;
pub mod prompts;

use async_trait::async_trait;
use storage::models::{Competition, Rating, RatingSource};

use crate::Result;

pub use ollama::OllamaRatingGenerator;
pub use ollama_client::OllamaClient;
pub use prompts::{PromptBuilder, PromptVariant};

/// Produces an excitement rating for a competition.
///
/// Implementations must bound every call with a finite timeout. Any failure
/// is reported as an error and left to the job queue to retry.
#[async_trait]
pub trait RatingGenerator: Send + Sync {
    /// Source tag stamped on every rating this generator returns
    fn source(&self) -> RatingSource;

    async fn produce_rating(&self, competition: &Competition) -> Result<Rating>;
}
