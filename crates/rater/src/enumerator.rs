use std::sync::Arc;

use storage::models::{Competition, Period, Sport};
use storage::repository::CompetitionStore;

use crate::error::{RaterError, Result};
use crate::observer::{PipelineEvent, PipelineObserver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumeratorLimits {
    pub max_periods: usize,
    pub max_competitions: usize,
}

impl Default for EnumeratorLimits {
    fn default() -> Self {
        Self {
            max_periods: 10,
            max_competitions: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentCompetitions {
    /// Most recent period first, store order within a period
    pub competitions: Vec<Competition>,
    pub periods_examined: usize,
    pub failed_periods: Vec<Period>,
}

/// Walks periods most recent first and collects their competitions until
/// either limit is hit.
///
/// A period that fails to load is reported and skipped. It still counts
/// towards `max_periods`.
pub struct PeriodEnumerator {
    store: Arc<dyn CompetitionStore>,
    observer: Arc<dyn PipelineObserver>,
    limits: EnumeratorLimits,
}

impl PeriodEnumerator {
    pub fn new(store: Arc<dyn CompetitionStore>, observer: Arc<dyn PipelineObserver>) -> Self {
        Self {
            store,
            observer,
            limits: EnumeratorLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: EnumeratorLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> EnumeratorLimits {
        self.limits
    }

    pub async fn recent_competitions(&self, sport: Sport) -> Result<RecentCompetitions> {
        let mut periods = self.store.get_available_periods(sport).await?;
        Period::sort_most_recent_first(&mut periods);

        let mut result = RecentCompetitions {
            competitions: Vec::new(),
            periods_examined: 0,
            failed_periods: Vec::new(),
        };

        for period in periods {
            if result.periods_examined >= self.limits.max_periods
                || result.competitions.len() >= self.limits.max_competitions
            {
                break;
            }
            result.periods_examined += 1;

            match self.store.find_by_period(sport, period).await {
                Ok(competitions) => result.competitions.extend(competitions),
                Err(e) => {
                    let error = RaterError::from(e);
                    self.observer.observe(&PipelineEvent::PeriodFetchFailed {
                        sport,
                        period,
                        error: &error,
                    });
                    result.failed_periods.push(period);
                }
            }
        }

        result.competitions.truncate(self.limits.max_competitions);
        Ok(result)
    }
}
