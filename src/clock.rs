//! Wall-clock sources.
//!
//! Code crash if there is a physical inconsistency (unrecoverable state).

/// Port for getting the current time.
pub trait Clock: Send + Sync {
    /// Get the current Unix timestamp in seconds.
    fn now(&self) -> u64;

    /// Get the current Unix timestamp in milliseconds.
    fn now_millis(&self) -> u128;
}

/// System clock using the OS time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before Unix epoch")
            .as_secs()
    }

    fn now_millis(&self) -> u128 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before Unix epoch")
            .as_millis()
    }
}

#[cfg(test)]
pub struct FixedClock {
    timestamp: u64,
}

#[cfg(test)]
impl FixedClock {
    pub fn new(timestamp: u64) -> Self {
        Self { timestamp }
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.timestamp
    }

    fn now_millis(&self) -> u128 {
        (self.timestamp * 1000) as u128
    }
}

/// Clock moved by hand, in milliseconds.
#[cfg(test)]
#[derive(Default)]
pub struct ManualClock {
    millis: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(millis: u64) -> Self {
        Self {
            millis: std::sync::atomic::AtomicU64::new(millis),
        }
    }

    pub fn set(&self, millis: u64) {
        self.millis
            .store(millis, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.millis.load(std::sync::atomic::Ordering::SeqCst) / 1000
    }

    fn now_millis(&self) -> u128 {
        self.millis.load(std::sync::atomic::Ordering::SeqCst) as u128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock() {
        let clock = SystemClock::new();
        let millis = clock.now_millis();

        // 2020-01-01.
        assert!(clock.now() > 1_577_836_800);
        assert!(millis / 1000 >= clock.now() as u128 - 1);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(29_500);
        assert_eq!(clock.now(), 29);

        clock.set(30_000);
        assert_eq!(clock.now(), 30);
        assert_eq!(clock.now_millis(), 30_000);
    }
}
