use crate::error::{MetricsError, Result};

/// 19 x 8 weeks, the size of the activity heat map.
pub const DEFAULT_LOOKBACK_WEEKS: u32 = 152;
pub const DEFAULT_MAX_SAMPLE_COUNT: usize = 30;

/// Everything a processing run needs, passed in explicitly.
pub struct Config<S, C> {
    pub lookback_weeks: u32,
    pub max_sample_count: usize,
    pub api_client: S,
    pub cache_client: C,
}

impl<S, C> Config<S, C> {
    pub fn new(api_client: S, cache_client: C) -> Self {
        Self {
            lookback_weeks: DEFAULT_LOOKBACK_WEEKS,
            max_sample_count: DEFAULT_MAX_SAMPLE_COUNT,
            api_client,
            cache_client,
        }
    }

    pub fn with_lookback_weeks(mut self, weeks: u32) -> Self {
        self.lookback_weeks = weeks;
        self
    }

    pub fn with_max_sample_count(mut self, count: usize) -> Self {
        self.max_sample_count = count;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback_weeks == 0 {
            return Err(MetricsError::InvalidArgument(
                "lookback_weeks must be positive".to_string(),
            ));
        }
        if self.max_sample_count < 2 {
            return Err(MetricsError::InvalidArgument(format!(
                "max_sample_count must be at least 2, got {}",
                self.max_sample_count
            )));
        }
        Ok(())
    }

    /// Samples with `max_sample_count`; see [`crate::sample::sample_releases`].
    pub fn sample_releases<T: Clone>(&self, releases: &[T]) -> Result<Vec<T>> {
        crate::sample::sample_releases(releases, self.max_sample_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::model::{ItemCategory, RepoId};
    use crate::source::{ItemSource, RawItems};
    use chrono::{DateTime, Utc};

    struct NoItems;

    impl ItemSource for NoItems {
        fn fetch(
            &self,
            _repo: &RepoId,
            _category: ItemCategory,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> Result<RawItems<'_>> {
            Ok(Box::new(std::iter::empty()))
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::new(NoItems, Cache::in_memory().unwrap());
        assert_eq!(config.lookback_weeks, DEFAULT_LOOKBACK_WEEKS);
        assert_eq!(config.max_sample_count, DEFAULT_MAX_SAMPLE_COUNT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let config = Config::new(NoItems, Cache::in_memory().unwrap()).with_max_sample_count(1);
        assert!(matches!(config.validate(), Err(MetricsError::InvalidArgument(_))));
        assert!(config.sample_releases(&[1, 2, 3, 4, 5, 6]).is_err());

        let config = Config::new(NoItems, Cache::in_memory().unwrap()).with_lookback_weeks(0);
        assert!(matches!(config.validate(), Err(MetricsError::InvalidArgument(_))));
    }

    #[test]
    fn samples_with_configured_count() {
        let config = Config::new((), ()).with_max_sample_count(5);
        let releases: Vec<u32> = (1..=20).collect();
        let sampled = config.sample_releases(&releases).unwrap();
        assert_eq!(sampled, vec![1, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20]);
    }
}
