use std::time::Duration;

/// Fixed delay applied between reconnect attempts after the first failure.
const STEADY_DELAY: Duration = Duration::from_millis(500);

/// Pacing for one reconnect episode: the first retry happens immediately,
/// every later retry waits a fixed half second. There is no attempt ceiling;
/// the loop runs until the simulator is reachable again or the channel is
/// closed.
///
/// State is local to one episode and discarded when a connect succeeds, so
/// independent channels never share retry state.
#[derive(Debug)]
pub(crate) struct RetryState {
    attempts: u32,
    delay: Duration,
}

impl RetryState {
    pub(crate) fn new() -> Self {
        Self {
            attempts: 0,
            delay: Duration::ZERO,
        }
    }

    /// Delay to apply after a failed attempt. Zero the first time, then
    /// [`STEADY_DELAY`] forever.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.delay;
        self.delay = STEADY_DELAY;
        self.attempts = self.attempts.saturating_add(1);
        delay
    }

    /// Failed attempts so far in this episode.
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Retry policy for the initial dial only.
///
/// Unlike the unbounded reconnect loop, the first connect gives up after a
/// bounded number of tries: if the simulator was never there, the caller
/// should hear about it.
#[derive(Debug, Clone)]
pub struct ConnectPolicy {
    /// Number of connection attempts before giving up. Minimum 1.
    pub tries: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            tries: 25,
            retry_delay: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_retry_is_immediate() {
        let mut retry = RetryState::new();
        assert_eq!(retry.next_delay(), Duration::ZERO);
    }

    #[test]
    fn later_retries_use_fixed_delay() {
        let mut retry = RetryState::new();
        retry.next_delay();
        for _ in 0..8 {
            assert_eq!(retry.next_delay(), Duration::from_millis(500));
        }
    }

    #[test]
    fn attempts_are_counted() {
        let mut retry = RetryState::new();
        assert_eq!(retry.attempts(), 0);
        retry.next_delay();
        retry.next_delay();
        assert_eq!(retry.attempts(), 2);
    }

    #[test]
    fn fresh_episode_starts_over() {
        let mut retry = RetryState::new();
        retry.next_delay();
        retry.next_delay();

        let mut fresh = RetryState::new();
        assert_eq!(fresh.next_delay(), Duration::ZERO);
    }

    #[test]
    fn connect_policy_defaults() {
        let policy = ConnectPolicy::default();
        assert_eq!(policy.tries, 25);
        assert_eq!(policy.retry_delay, Duration::from_secs(5));
    }
}
