pub mod competition;
pub mod period;
pub mod rating;
pub mod team;

pub use competition::{Competition, HomeAway, TeamParticipation};
pub use period::{Period, PeriodType, Sport};
pub use rating::{Rating, RatingCategory, RatingScore, RatingSource, RatingType};
pub use team::{Team, TeamRecord};
