//! Engine configuration

/// Timing and retry bounds for protocol operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NandConfig {
    /// Give up waiting for the ready line after this many microseconds
    pub ready_timeout_us: u32,
    /// Delay between two ready-line samples
    pub poll_interval_us: u32,
    /// How often a program that reports FAIL is repeated before giving up
    pub program_retries: u32,
    /// Delay between the feature address cycle and the data phase
    pub feature_settle_us: u32,
}

impl Default for NandConfig {
    fn default() -> Self {
        Self {
            ready_timeout_us: 2_000_000,
            poll_interval_us: 100,
            program_retries: 3,
            feature_settle_us: 50_000,
        }
    }
}

impl NandConfig {
    /// Override the ready timeout
    pub fn with_ready_timeout_us(mut self, us: u32) -> Self {
        self.ready_timeout_us = us;
        self
    }

    /// Override the number of program retries
    pub fn with_program_retries(mut self, retries: u32) -> Self {
        self.program_retries = retries;
        self
    }

    /// Override the feature settle delay
    pub fn with_feature_settle_us(mut self, us: u32) -> Self {
        self.feature_settle_us = us;
        self
    }

    /// Number of ready-line samples taken before reporting a timeout
    pub fn max_polls(&self) -> u32 {
        if self.poll_interval_us > 0 {
            (self.ready_timeout_us / self.poll_interval_us).max(1)
        } else {
            // Fall back to polling once per microsecond
            self.ready_timeout_us.max(1)
        }
    }
}
