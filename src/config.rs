//! Pool configuration options

/// A single configuration option, applied in order by
/// [`PoolConfiguration::from_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolOption {
    /// Maximum number of items that may be borrowed at once. `0` is unbounded.
    Size(usize),

    /// Number of items created and parked in the idle cache at construction.
    Bootstrap(usize),
}

/// Configuration for bounded pool behavior
///
/// # Examples
///
/// ```
/// use bounded_pool::PoolConfiguration;
///
/// let config = PoolConfiguration::new()
///     .with_size(2)
///     .with_bootstrap(5);
///
/// // size is promoted so the pool can hold every bootstrapped item
/// assert_eq!(config.max_size(), 5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolConfiguration {
    /// Requested maximum number of concurrently borrowed items (0 = unbounded)
    pub size: usize,

    /// Number of items to pre-create during construction
    pub bootstrap: usize,
}

impl PoolConfiguration {
    /// Create a new configuration with default values (unbounded, no warm-up)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration by applying `options` in order.
    ///
    /// A later option of the same kind overrides an earlier one.
    ///
    /// ```
    /// use bounded_pool::{PoolConfiguration, PoolOption};
    ///
    /// let config = PoolConfiguration::from_options([
    ///     PoolOption::Size(10),
    ///     PoolOption::Bootstrap(3),
    ///     PoolOption::Size(4),
    /// ]);
    ///
    /// assert_eq!(config.size, 4);
    /// assert_eq!(config.bootstrap, 3);
    /// ```
    pub fn from_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = PoolOption>,
    {
        options
            .into_iter()
            .fold(Self::default(), |config, option| config.apply(option))
    }

    /// Apply one option on top of this configuration
    pub fn apply(self, option: PoolOption) -> Self {
        match option {
            PoolOption::Size(size) => self.with_size(size),
            PoolOption::Bootstrap(count) => self.with_bootstrap(count),
        }
    }

    /// Set the maximum number of concurrently borrowed items
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set the warm-up count
    pub fn with_bootstrap(mut self, count: usize) -> Self {
        self.bootstrap = count;
        self
    }

    /// Effective maximum after promoting `size` up to `bootstrap`.
    pub fn max_size(&self) -> usize {
        self.size.max(self.bootstrap)
    }

    /// Whether the effective configuration limits concurrent borrows
    pub fn is_bounded(&self) -> bool {
        self.max_size() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded() {
        let config = PoolConfiguration::default();
        assert_eq!(config.max_size(), 0);
        assert!(!config.is_bounded());
    }

    #[test]
    fn test_size_promoted_to_bootstrap() {
        let config = PoolConfiguration::from_options([PoolOption::Size(2), PoolOption::Bootstrap(5)]);
        assert_eq!(config.size, 2);
        assert_eq!(config.max_size(), 5);
    }

    #[test]
    fn test_bootstrap_alone_bounds_pool() {
        let config = PoolConfiguration::new().with_bootstrap(3);
        assert!(config.is_bounded());
        assert_eq!(config.max_size(), 3);
    }

    #[test]
    fn test_options_apply_in_order() {
        let config = PoolConfiguration::from_options([
            PoolOption::Bootstrap(1),
            PoolOption::Size(8),
            PoolOption::Bootstrap(2),
        ]);
        assert_eq!(config, PoolConfiguration { size: 8, bootstrap: 2 });
    }
}
