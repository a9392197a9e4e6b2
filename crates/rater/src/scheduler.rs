//! Enqueues rating jobs for finished competitions reported by a sports data
//! provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storage::models::{Competition, Period, Sport};
use storage::repository::CompetitionStore;

use crate::error::Result;
use crate::jobs::{JobPayload, JobQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionStatus {
    Scheduled,
    InProgress,
    Final,
    Postponed,
    Canceled,
}

impl CompetitionStatus {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompetitionDetails {
    pub competition: Competition,
    pub status: CompetitionStatus,
}

/// Narrow view of an upstream sports data provider. Implementations map the
/// provider's own response shapes onto these types.
#[async_trait]
pub trait SportsDataService: Send + Sync {
    async fn get_available_periods(&self, sport: Sport, season: i32) -> Result<Vec<Period>>;

    async fn get_latest(&self, sport: Sport) -> Result<Period>;

    async fn get_competitions(&self, sport: Sport, period: Period) -> Result<Vec<Competition>>;

    async fn get_competition_details(&self, competition_id: &str) -> Result<CompetitionDetails>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleReport {
    pub examined: usize,
    pub enqueued: Vec<String>,
    pub already_rated: usize,
    pub not_final: usize,
    /// Competition id and error for every competition that could not be checked
    pub failed: Vec<(String, String)>,
}

impl ScheduleReport {
    fn merge(&mut self, other: ScheduleReport) {
        self.examined += other.examined;
        self.enqueued.extend(other.enqueued);
        self.already_rated += other.already_rated;
        self.not_final += other.not_final;
        self.failed.extend(other.failed);
    }
}

pub struct RatingScheduler {
    sports_data: Arc<dyn SportsDataService>,
    store: Arc<dyn CompetitionStore>,
    queue: Arc<dyn JobQueue>,
}

impl RatingScheduler {
    pub fn new(
        sports_data: Arc<dyn SportsDataService>,
        store: Arc<dyn CompetitionStore>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            sports_data,
            store,
            queue,
        }
    }

    pub async fn schedule_latest(&self, sport: Sport) -> Result<ScheduleReport> {
        let period = self.sports_data.get_latest(sport).await?;
        self.schedule_period(sport, period).await
    }

    pub async fn schedule_season(&self, sport: Sport, season: i32) -> Result<ScheduleReport> {
        let mut report = ScheduleReport::default();
        for period in self.sports_data.get_available_periods(sport, season).await? {
            report.merge(self.schedule_period(sport, period).await?);
        }
        Ok(report)
    }

    pub async fn schedule_period(&self, sport: Sport, period: Period) -> Result<ScheduleReport> {
        let mut report = ScheduleReport::default();

        for competition in self.sports_data.get_competitions(sport, period).await? {
            report.examined += 1;
            let id = competition.competition_id;

            let details = match self.sports_data.get_competition_details(&id).await {
                Ok(details) => details,
                Err(e) => {
                    report.failed.push((id, e.to_string()));
                    continue;
                }
            };
            if !details.status.is_final() {
                report.not_final += 1;
                continue;
            }

            match self.store.get_rating(&id).await {
                Ok(_) => report.already_rated += 1,
                Err(e) if e.is_not_found() => {
                    self.queue
                        .enqueue(&JobPayload::sentiment_analysis(id.clone(), false))
                        .await?;
                    report.enqueued.push(id);
                }
                Err(e) => report.failed.push((id, e.to_string())),
            }
        }

        Ok(report)
    }
}
