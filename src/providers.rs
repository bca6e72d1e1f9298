//! Injection seams shared by several modules.
//!
//! Anything that reads the clock goes through [`TimeProvider`] so history
//! timestamps can be pinned in tests.

/// Source of wall-clock timestamps.
///
/// # Example
///
/// ```
/// use termnl::providers::{SystemTimeProvider, TimeProvider};
///
/// let clock = SystemTimeProvider;
/// assert!(clock.now() > 0);
/// ```
pub trait TimeProvider: Send + Sync {
    /// Current Unix timestamp in seconds.
    fn now(&self) -> u64;
}

/// Reads the system clock.
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Clock that always reports the same instant.
pub struct FixedTimeProvider(pub u64);

impl TimeProvider for FixedTimeProvider {
    fn now(&self) -> u64 {
        self.0
    }
}
