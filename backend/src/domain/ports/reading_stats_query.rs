//! Driving port for reading statistics.

use async_trait::async_trait;

use crate::domain::{Error, GroupBy, ReadingStats, StatsPeriod, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingStatsQuery: Send + Sync {
    async fn stats(
        &self,
        user_id: &UserId,
        period: StatsPeriod,
        group_by: Option<GroupBy>,
    ) -> Result<ReadingStats, Error>;
}
