use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Team {
    pub team_id: String,
    pub display_name: String,
    pub abbreviation: Option<String>,
    pub logo_url: Option<String>,
}

/// Season win/loss record as it stood when the competition was loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TeamRecord {
    pub wins: i32,
    pub losses: i32,
    pub ties: i32,
}

impl TeamRecord {
    pub fn new(wins: i32, losses: i32, ties: i32) -> Self {
        Self { wins, losses, ties }
    }
}

impl fmt::Display for TeamRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ties > 0 {
            write!(f, "{}-{}-{}", self.wins, self.losses, self.ties)
        } else {
            write!(f, "{}-{}", self.wins, self.losses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_display() {
        assert_eq!(TeamRecord::new(10, 7, 0).to_string(), "10-7");
        assert_eq!(TeamRecord::new(9, 7, 1).to_string(), "9-7-1");
    }
}
