//! Pool size and thread count limits

use std::num::NonZeroUsize;

nonzero_newtype! {
    /// A non-zero maximum connections limit
    ///
    /// Ensures every instance pool can hand out at least one connection.
    ///
    /// # Examples
    /// ```
    /// use queue_scouter::types::MaxConnections;
    ///
    /// let max = MaxConnections::new(4).unwrap();
    /// assert_eq!(max.get(), 4);
    /// assert!(MaxConnections::new(0).is_none());
    /// ```
    #[doc(alias = "pool_size")]
    pub struct MaxConnections(NonZeroUsize: usize);
}

impl MaxConnections {
    /// Default connections per instance pool (idle subscriber, role monitor, configurator, spare)
    pub const DEFAULT: Self = Self(NonZeroUsize::new(4).unwrap());
}

impl Default for MaxConnections {
    fn default() -> Self {
        Self::DEFAULT
    }
}

nonzero_newtype! {
    /// A non-zero runtime worker thread count
    pub struct ThreadCount(NonZeroUsize: usize);
}

impl ThreadCount {
    /// Number of available CPUs, falling back to one
    #[must_use]
    pub fn available() -> Self {
        std::thread::available_parallelism()
            .ok()
            .and_then(|p| Self::new(p.get()))
            .unwrap_or(Self(NonZeroUsize::MIN))
    }
}

impl std::str::FromStr for ThreadCount {
    type Err = String;

    /// `0` means "one per CPU"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid thread count '{}': {}", s, e))?;
        Ok(Self::new(value).unwrap_or_else(Self::available))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_connections_default() {
        assert_eq!(MaxConnections::default().get(), 4);
    }

    #[test]
    fn test_max_connections_from_toml() {
        #[derive(serde::Deserialize)]
        struct Pool {
            max_size: MaxConnections,
        }
        let pool: Pool = toml::from_str("max_size = 8").unwrap();
        assert_eq!(pool.max_size.get(), 8);
        assert_eq!(pool.max_size.to_string(), "8");
        assert!(toml::from_str::<Pool>("max_size = 0").is_err());
    }

    #[test]
    fn test_thread_count_zero_means_cpus() {
        let count: ThreadCount = "0".parse().unwrap();
        assert_eq!(count, ThreadCount::available());
        assert!(count.get() >= 1);
    }

    #[test]
    fn test_thread_count_explicit() {
        let count: ThreadCount = "3".parse().unwrap();
        assert_eq!(count.get(), 3);
        assert!("three".parse::<ThreadCount>().is_err());
    }
}
