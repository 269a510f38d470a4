//! Keep-alive heartbeat for long-running publish steps.
//!
//! CI runners kill jobs whose output goes quiet for too long (CircleCI's
//! context deadline is 10 minutes). Closing a Maven Central staging
//! repository can sit silent well past that, so steps known to run long are
//! bracketed with a heartbeat: while the step is in flight, a shared
//! background timer emits one benign log line per period, and the timer is
//! cancelled the moment the step ends — normally or not.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use extpub_heartbeat::{DEFAULT_MESSAGE, with_heartbeat};
//!
//! let released = with_heartbeat(
//!     Duration::from_secs(300),
//!     || eprintln!("{DEFAULT_MESSAGE}"),
//!     || {
//!         // close and release the staging repository...
//!         true
//!     },
//! );
//! assert!(released);
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

/// Default heartbeat period: half of the assumed 10-minute CI silence
/// timeout.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Default keep-alive line. Human-readable only, nothing parses it.
pub const DEFAULT_MESSAGE: &str = "Printing output to avoid hitting context deadline";

struct TimerEntry {
    next_fire: Instant,
    period: Duration,
    cancelled: Arc<AtomicBool>,
    tick: Box<dyn Fn() + Send>,
}

/// One scheduler thread serves every heartbeat in the process. Ticks are
/// infrequent and independent, so a single worker is enough.
fn scheduler() -> &'static Sender<TimerEntry> {
    static SCHEDULER: OnceLock<Sender<TimerEntry>> = OnceLock::new();
    SCHEDULER.get_or_init(|| {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("extpub-heartbeat".to_string())
            .spawn(move || run_scheduler(&rx))
            .expect("failed to spawn heartbeat scheduler thread");
        tx
    })
}

fn run_scheduler(rx: &mpsc::Receiver<TimerEntry>) {
    let mut timers: Vec<TimerEntry> = Vec::new();

    loop {
        timers.retain(|timer| !timer.cancelled.load(Ordering::Acquire));

        let now = Instant::now();
        let until_due = timers
            .iter()
            .map(|timer| timer.next_fire.saturating_duration_since(now))
            .min();

        // Sleep until the next timer is due, waking early for registrations.
        let registered = match until_due {
            Some(wait) => match rx.recv_timeout(wait) {
                Ok(entry) => Some(entry),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => return,
            },
            None => match rx.recv() {
                Ok(entry) => Some(entry),
                Err(_) => return,
            },
        };
        if let Some(entry) = registered {
            timers.push(entry);
        }

        let now = Instant::now();
        for timer in &mut timers {
            if timer.cancelled.load(Ordering::Acquire) || now < timer.next_fire {
                continue;
            }
            // A panicking tick must never take the scheduler (or the wrapped
            // operation) down with it.
            let _ = catch_unwind(AssertUnwindSafe(|| (timer.tick)()));
            timer.next_fire = Instant::now() + timer.period;
        }
    }
}

/// Handle to an active heartbeat. Cancels the timer when dropped.
///
/// Dropping is the only way the timer stops, so tying the guard's lifetime to
/// the wrapped operation's scope covers success, error returns, and unwinds
/// alike. Cancellation is idempotent and best-effort immediate: once the
/// flag is set the scheduler drops the timer before its next tick.
#[derive(Debug)]
pub struct HeartbeatGuard {
    cancelled: Arc<AtomicBool>,
}

impl HeartbeatGuard {
    /// Cancel the heartbeat now instead of waiting for drop.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether this heartbeat has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for HeartbeatGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start a heartbeat that invokes `tick` every `period`, first fire after
/// one full `period`.
///
/// The returned guard owns the timer; keep it alive for as long as the
/// keep-alive output should flow.
pub fn start(period: Duration, tick: impl Fn() + Send + 'static) -> HeartbeatGuard {
    let cancelled = Arc::new(AtomicBool::new(false));
    let entry = TimerEntry {
        next_fire: Instant::now() + period,
        period,
        cancelled: Arc::clone(&cancelled),
        tick: Box::new(tick),
    };
    // If the scheduler thread is gone the heartbeat silently stops; the
    // wrapped operation must not be affected.
    let _ = scheduler().send(entry);
    HeartbeatGuard { cancelled }
}

/// Run `op` with an active heartbeat, cancelling it when `op` ends.
///
/// `op`'s return value, error, or panic propagates unchanged; the guard is
/// dropped on the way out in every case.
pub fn with_heartbeat<T>(
    period: Duration,
    tick: impl Fn() + Send + 'static,
    op: impl FnOnce() -> T,
) -> T {
    let _guard = start(period, tick);
    op()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_tick() -> (Arc<AtomicUsize>, impl Fn() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let tick_count = Arc::clone(&count);
        (count, move || {
            tick_count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn ticks_while_operation_runs_then_stops() {
        let (count, tick) = counting_tick();

        with_heartbeat(Duration::from_millis(10), tick, || {
            thread::sleep(Duration::from_millis(35));
        });

        let observed = count.load(Ordering::SeqCst);
        assert!(
            (2..=4).contains(&observed),
            "expected 2..=4 ticks during a 35ms operation, got {observed}"
        );

        // No further ticks after the guard is dropped.
        thread::sleep(Duration::from_millis(40));
        assert_eq!(count.load(Ordering::SeqCst), observed);
    }

    #[test]
    fn first_fire_waits_a_full_period() {
        let (count, tick) = counting_tick();

        with_heartbeat(Duration::from_millis(50), tick, || {
            thread::sleep(Duration::from_millis(10));
        });

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancelled_on_panic_and_panic_propagates() {
        let (count, tick) = counting_tick();

        let result = catch_unwind(AssertUnwindSafe(|| {
            with_heartbeat(Duration::from_millis(10), tick, || {
                thread::sleep(Duration::from_millis(25));
                panic!("publish exploded");
            });
        }));
        assert!(result.is_err());

        thread::sleep(Duration::from_millis(25));
        let after_panic = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(count.load(Ordering::SeqCst), after_panic);
    }

    #[test]
    fn error_return_propagates_unchanged() {
        let (_count, tick) = counting_tick();

        let result: Result<(), &str> =
            with_heartbeat(Duration::from_millis(10), tick, || Err("staging close failed"));

        assert_eq!(result, Err("staging close failed"));
    }

    #[test]
    fn panicking_tick_is_swallowed() {
        let ticked = Arc::new(AtomicBool::new(false));
        let tick_flag = Arc::clone(&ticked);

        with_heartbeat(
            Duration::from_millis(5),
            move || {
                tick_flag.store(true, Ordering::SeqCst);
                panic!("tick failure");
            },
            || thread::sleep(Duration::from_millis(30)),
        );

        // The tick fired and panicked, yet the operation completed and the
        // scheduler is still serving new heartbeats.
        assert!(ticked.load(Ordering::SeqCst));

        let (count, tick) = counting_tick();
        with_heartbeat(Duration::from_millis(5), tick, || {
            thread::sleep(Duration::from_millis(30));
        });
        assert!(count.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn explicit_cancel_is_idempotent() {
        let (count, tick) = counting_tick();

        let guard = start(Duration::from_millis(10), tick);
        guard.cancel();
        guard.cancel();
        assert!(guard.is_cancelled());
        drop(guard);

        thread::sleep(Duration::from_millis(35));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_heartbeats_do_not_interfere() {
        let (count_a, tick_a) = counting_tick();
        let (count_b, tick_b) = counting_tick();

        let guard_a = start(Duration::from_millis(10), tick_a);
        let guard_b = start(Duration::from_millis(10), tick_b);

        thread::sleep(Duration::from_millis(35));
        drop(guard_a);

        thread::sleep(Duration::from_millis(35));
        drop(guard_b);

        let a = count_a.load(Ordering::SeqCst);
        let b = count_b.load(Ordering::SeqCst);
        assert!(a >= 2, "first heartbeat ticked {a} times");
        assert!(b > a, "second heartbeat should outlive the first ({b} vs {a})");
    }
}
