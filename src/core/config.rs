//! # Manager configuration.
//!
//! Provides [`ManagerConfig`] centralized settings for a [`Manager`](crate::Manager).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1

/// Settings for a [`Manager`](crate::Manager).
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1)
/// - `cancel_on_failure`: cancel the remaining controllers when one fails
///
/// ## Example
/// ```rust
/// use ctrlvisor::ManagerConfig;
///
/// let cfg = ManagerConfig {
///     cancel_on_failure: true,
///     ..ManagerConfig::default()
/// };
/// assert_eq!(cfg.bus_capacity, 1024);
/// ```
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// skip older items.
    pub bus_capacity: usize,

    /// Cancel the remaining controllers after the first failure.
    ///
    /// - `false`: the manager returns the error and leaves the other
    ///   controllers running until the caller fires its stop token.
    /// - `true`: the manager also cancels the token every controller was
    ///   started with (a child of the caller's stop token; the caller's own
    ///   token is left untouched).
    pub cancel_on_failure: bool,
}

impl ManagerConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for ManagerConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `cancel_on_failure = false`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            cancel_on_failure: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_keeps_other_defaults() {
        let cfg = ManagerConfig {
            bus_capacity: 0,
            ..ManagerConfig::default()
        };
        assert!(!cfg.cancel_on_failure);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
