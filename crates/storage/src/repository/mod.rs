pub mod competition;
pub mod rating;
mod store;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Competition, Period, Rating, Sport};

pub use competition::CompetitionRepository;
pub use rating::{RatingRepository, RatingWrite};
pub use store::PgCompetitionStore;

/// Persistence capability consumed by the rating pipeline.
///
/// Reads have no side effects. `save_rating` is an upsert keyed by
/// competition: calling it twice with the same arguments leaves one row,
/// and a rating from a lower priority source never replaces the stored one.
#[async_trait]
pub trait CompetitionStore: Send + Sync {
    /// Loads a competition together with its current rating, if any.
    async fn get_competition_by_id(&self, competition_id: &str) -> Result<Competition>;

    async fn find_by_period(&self, sport: Sport, period: Period) -> Result<Vec<Competition>>;

    /// Periods that have at least one competition, most recent first.
    async fn get_available_periods(&self, sport: Sport) -> Result<Vec<Period>>;

    /// Stores `rating` for `competition` along with a snapshot of the
    /// competition as it is now.
    async fn save_rating(&self, competition: &Competition, rating: &Rating) -> Result<RatingWrite>;

    async fn get_rating(&self, competition_id: &str) -> Result<Rating>;
}
