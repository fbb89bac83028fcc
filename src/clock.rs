use std::time::SystemTime;

/**
 * Wall clock used for key expiry deadlines
 */
pub struct Clock;

#[cfg(not(test))]
impl Clock {
    pub fn now() -> SystemTime {
        SystemTime::now()
    }
}

#[cfg(test)]
pub use test_clock::*;

/**
 * Test implementation for Clock, including mocked system time
 */
