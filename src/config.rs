//! Construction-time tuning for `ChainedHashMap`.

/// Bucket count used by `ChainedHashMap::new`.
pub const DEFAULT_BUCKET_COUNT: usize = 1024;

/// Load factor ceiling used unless configured otherwise.
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 2.0;

/// Map configuration
///
/// ```
/// use chain_hashmap::{ChainedHashMap, MapConfig};
///
/// let map: ChainedHashMap<u32, u32> =
///     ChainedHashMap::with_config(MapConfig::default().bucket_count(16).max_load_factor(1.0));
/// assert_eq!(map.bucket_count(), 16);
/// assert_eq!(map.max_load_factor(), 1.0);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MapConfig {
    /// Initial number of buckets; zero is raised to one
    #[doc(hidden)]
    pub bucket_count: usize,

    /// Average chain length that triggers growth
    #[doc(hidden)]
    pub max_load_factor: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

impl MapConfig {
    /// Sets the initial bucket count.
    ///
    /// Defaults to 1024.
    #[must_use]
    pub fn bucket_count(mut self, n: usize) -> Self {
        self.bucket_count = n.max(1);
        self
    }

    /// Sets the maximum load factor.
    ///
    /// Defaults to 2.0.
    ///
    /// # Panics
    ///
    /// Panics if `ml` is not a finite, positive number.
    #[must_use]
    pub fn max_load_factor(mut self, ml: f32) -> Self {
        check_load_factor(ml);
        self.max_load_factor = ml;
        self
    }
}

pub(crate) fn check_load_factor(ml: f32) {
    assert!(
        ml.is_finite() && ml > 0.0,
        "max load factor must be finite and positive, got {ml}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = MapConfig::default();
        assert_eq!(c.bucket_count, 1024);
        assert_eq!(c.max_load_factor, 2.0);
    }

    #[test]
    fn zero_bucket_count_is_raised() {
        assert_eq!(MapConfig::default().bucket_count(0).bucket_count, 1);
    }

    #[test]
    #[should_panic(expected = "max load factor")]
    fn non_positive_load_factor_panics() {
        let _ = MapConfig::default().max_load_factor(0.0);
    }
}
