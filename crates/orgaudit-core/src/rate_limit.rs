//! Fixed-window limiter for content-mutation calls.
//!
//! Waiters are served oldest first: the state lives behind a
//! `tokio::sync::Mutex`, which queues lockers in FIFO order, and the lock is
//! held while a caller sleeps until the next window opens.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
struct Window {
    started: Option<Instant>,
    used: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    max_ops: u32,
    period: Duration,
    window: Mutex<Window>,
}

impl RateLimiter {
    /// `max_ops` operations per `period`. A zero `max_ops` is treated as one.
    pub fn new(max_ops: u32, period: Duration) -> Self {
        Self {
            max_ops: max_ops.max(1),
            period,
            window: Mutex::new(Window {
                started: None,
                used: 0,
            }),
        }
    }

    /// One content mutation per second.
    pub fn content_mutations() -> Self {
        Self::new(1, Duration::from_secs(1))
    }

    /// Wait for a slot in the current or a later window.
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;
        let now = Instant::now();

        match window.started {
            Some(started) if now < started + self.period => {
                if window.used < self.max_ops {
                    window.used += 1;
                    return;
                }
                let next = started + self.period;
                tracing::debug!(
                    wait_ms = next.saturating_duration_since(now).as_millis() as u64,
                    "rate limiter waiting for next window"
                );
                sleep_until(next).await;
                window.started = Some(next);
                window.used = 1;
            }
            _ => {
                window.started = Some(now);
                window.used = 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::content_mutations();
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_acquire_waits_for_next_window() {
        let limiter = RateLimiter::content_mutations();
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(Instant::now() - start, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets_after_idle_period() {
        let limiter = RateLimiter::content_mutations();
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiple_ops_per_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(Instant::now(), start);
        limiter.acquire().await;
        assert_eq!(Instant::now() - start, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_are_served_in_arrival_order() {
        let limiter = Arc::new(RateLimiter::content_mutations());
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        limiter.acquire().await;

        let mut handles = Vec::new();
        for id in 0..3 {
            let limiter = Arc::clone(&limiter);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                order.lock().unwrap().push(id);
            }));
            // let each task reach the mutex queue before spawning the next
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }
}
