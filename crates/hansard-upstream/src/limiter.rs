//! Admission control for outbound requests.
//!
//! Both Parliament APIs throttle aggressively, so every request the process
//! sends passes through one shared [`RateLimiter`] before it is dispatched.
//! The limiter is a constructed object handed to the fetch client — there is
//! no ambient global state.

use std::sync::{
  Arc,
  atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use tokio::sync::Semaphore;

/// Dispatch ceiling: at most `max_per_window` admissions per rolling
/// `window`, shared across all callers.
///
/// Admission is FIFO: callers queue on a fair semaphore holding one permit
/// per slot, and each acquired slot is handed back one full window after the
/// admission it paid for. With the default settings (5 per second) the
/// sixth caller in a burst waits until a second has passed since the first
/// dispatch.
#[derive(Clone)]
pub struct RateLimiter {
  slots:  Arc<Semaphore>,
  window: Duration,
  queued: Arc<AtomicUsize>,
}

impl RateLimiter {
  /// The ceiling both Parliament APIs tolerate.
  pub const DEFAULT_MAX_PER_WINDOW: usize = 5;
  pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

  pub fn new(max_per_window: usize, window: Duration) -> Self {
    Self {
      slots:  Arc::new(Semaphore::new(max_per_window)),
      window,
      queued: Arc::new(AtomicUsize::new(0)),
    }
  }

  /// Block until a dispatch slot is free, consume it, and schedule its
  /// return one window from now. Returns once the caller may dispatch.
  pub async fn admit(&self) {
    self.queued.fetch_add(1, Ordering::Relaxed);
    let permit = self
      .slots
      .clone()
      .acquire_owned()
      .await
      .expect("rate limiter semaphore is never closed");
    self.queued.fetch_sub(1, Ordering::Relaxed);

    // The slot is not returned on drop; it comes back one window after
    // this admission, which is what bounds the rolling-window rate.
    permit.forget();
    let slots  = Arc::clone(&self.slots);
    let window = self.window;
    tokio::spawn(async move {
      tokio::time::sleep(window).await;
      slots.add_permits(1);
    });
  }

  /// Number of callers currently waiting for admission.
  pub fn queued(&self) -> usize { self.queued.load(Ordering::Relaxed) }
}

impl Default for RateLimiter {
  fn default() -> Self {
    Self::new(Self::DEFAULT_MAX_PER_WINDOW, Self::DEFAULT_WINDOW)
  }
}
