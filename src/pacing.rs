//! Send pacing: randomized gaps between messages and a longer cooldown after
//! every full batch.

use std::time::Duration;

use rand::Rng;

use crate::error::{Error, Result};

/// Pacing parameters for one bulk run, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Minimum delay between messages (inclusive)
    pub delay_min: u64,
    /// Maximum delay between messages (inclusive)
    pub delay_max: u64,
    /// Number of messages before taking a longer break
    pub batch_size: usize,
    /// Delay after each batch
    pub batch_delay: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            delay_min: 60,
            delay_max: 120,
            batch_size: 10,
            batch_delay: 300,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if self.delay_min > self.delay_max {
            return Err(Error::Config(format!(
                "delay_min ({}) is greater than delay_max ({})",
                self.delay_min, self.delay_max
            )));
        }
        Ok(())
    }

    /// Pause to take after the message at `position` (1-based) out of `total`.
    /// Nothing follows the last message.
    pub fn pause_after<R: Rng + ?Sized>(
        &self,
        position: usize,
        total: usize,
        rng: &mut R,
    ) -> Option<Pause> {
        if position >= total {
            return None;
        }
        if self.batch_size > 0 && position % self.batch_size == 0 {
            Some(Pause::BatchCooldown(Duration::from_secs(self.batch_delay)))
        } else {
            let secs = rng.gen_range(self.delay_min..=self.delay_max);
            Some(Pause::Jitter(Duration::from_secs(secs)))
        }
    }
}

/// A planned pause between two sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// Random gap drawn from `[delay_min, delay_max]`
    Jitter(Duration),
    /// Fixed cooldown after a full batch
    BatchCooldown(Duration),
}

impl Pause {
    pub fn duration(&self) -> Duration {
        match self {
            Pause::Jitter(d) | Pause::BatchCooldown(d) => *d,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Pause::Jitter(_) => "jitter",
            Pause::BatchCooldown(_) => "batch",
        }
    }
}

/// Where the messenger waits. Swapped out in tests so runs finish instantly.
#[allow(async_fn_in_trait)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeping on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
