// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Scoped elapsed-time measurement.
//!
//! A [`ScopedTimer`] is bracketed by a [`TimerScope`] guard. The guard records
//! the end instant when it is dropped, which happens on every exit path:
//! normal return, early `?` return, or a panic unwinding through the scope.

use std::time::{Duration, Instant};

/// One-shot timer whose elapsed value is frozen once its scope closes.
#[derive(Debug, Default)]
pub struct ScopedTimer {
    elapsed: Option<Duration>,
}

impl ScopedTimer {
    /// Create a timer that has not been entered yet.
    pub fn new() -> Self {
        Self { elapsed: None }
    }

    /// Record the start instant and return the guard that closes the scope.
    pub fn enter(&mut self) -> TimerScope<'_> {
        TimerScope {
            timer: self,
            start: Instant::now(),
        }
    }

    /// Run `work` inside a scope and return its output.
    pub fn time<T, F>(&mut self, work: F) -> T
    where
        F: FnOnce() -> T,
    {
        let _scope = self.enter();
        work()
    }

    /// Elapsed time, or zero while the scope has not closed.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.unwrap_or(Duration::ZERO)
    }

    /// Elapsed time in fractional seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Whether a scope has closed and the value is final.
    pub fn is_stopped(&self) -> bool {
        self.elapsed.is_some()
    }
}

/// Guard that stops its timer when dropped.
#[must_use = "the timer stops as soon as the scope guard is dropped"]
pub struct TimerScope<'a> {
    timer: &'a mut ScopedTimer,
    start: Instant,
}

impl Drop for TimerScope<'_> {
    fn drop(&mut self) {
        if self.timer.elapsed.is_none() {
            self.timer.elapsed = Some(self.start.elapsed());
        }
    }
}

/// Measure the execution time of a closure.
pub fn measure<F, T>(f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let mut timer = ScopedTimer::new();
    let result = timer.time(f);
    (result, timer.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;

    #[test]
    fn test_measures_elapsed_time() {
        let mut timer = ScopedTimer::new();
        timer.time(|| thread::sleep(Duration::from_millis(50)));

        assert!(timer.elapsed() >= Duration::from_millis(50));
        assert!(timer.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_zero_before_scope_closes() {
        let mut timer = ScopedTimer::new();
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert!(!timer.is_stopped());

        {
            let _scope = timer.enter();
            thread::sleep(Duration::from_millis(5));
        }
        assert!(timer.is_stopped());
        assert!(timer.elapsed_secs() > 0.0);
    }

    #[test]
    fn test_frozen_after_exit() {
        let mut timer = ScopedTimer::new();
        timer.time(|| thread::sleep(Duration::from_millis(5)));
        let first = timer.elapsed();

        thread::sleep(Duration::from_millis(10));
        timer.time(|| thread::sleep(Duration::from_millis(20)));
        assert_eq!(timer.elapsed(), first);
    }

    #[test]
    fn test_measured_when_work_fails() {
        let mut timer = ScopedTimer::new();
        let result: Result<(), String> = timer.time(|| {
            thread::sleep(Duration::from_millis(5));
            Err("query failed".to_string())
        });

        assert!(result.is_err());
        assert!(timer.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_measured_when_work_panics() {
        let mut timer = ScopedTimer::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            timer.time(|| {
                thread::sleep(Duration::from_millis(5));
                panic!("engine crashed");
            })
        }));

        assert!(outcome.is_err());
        assert!(timer.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_measure() {
        let (result, duration) = measure(|| {
            thread::sleep(Duration::from_millis(5));
            42
        });

        assert_eq!(result, 42);
        assert!(duration >= Duration::from_millis(5));
    }
}
