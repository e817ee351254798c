//! Background notification sweep
//!
//! This module provides the `Sweeper` struct which runs a single daemon
//! thread pre-generating suggestion content for pending notifications. The
//! sweep polls the [`NotificationFeed`], drives
//! [`SuggestionService::generate_content`] for every pair that does not yet
//! carry generated content, then sleeps: a short busy delay after a pass
//! that did work, a long idle delay after a pass that found nothing.
//!
//! Start is guarded by an atomic swap, so two callers racing on `start()`
//! can never spawn two threads. A failure for one notification is logged
//! and the pass moves on; the sweep itself never dies to a single bad
//! generation.
//!
//! [`NotificationFeed`]: crate::store::NotificationFeed
//! [`SuggestionService::generate_content`]: crate::suggestion::SuggestionService::generate_content

use crate::store::{NotificationFeed, SuggestionStore};
use crate::suggestion::SuggestionService;
use crate::types::QuireConfig;
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Background worker pre-generating suggestion content
///
/// Holds the running flag and the join handle; the worker thread owns
/// clones of the shared stores through the [`SuggestionService`].
pub struct Sweeper {
    service: Arc<SuggestionService>,
    feed: Arc<dyn NotificationFeed>,
    suggestions: Arc<dyn SuggestionStore>,
    /// Whether the sweep thread is running
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    busy_delay: Duration,
    idle_delay: Duration,
}

impl Sweeper {
    /// Create a stopped sweeper over the shared service and stores
    pub fn new(
        service: Arc<SuggestionService>,
        feed: Arc<dyn NotificationFeed>,
        suggestions: Arc<dyn SuggestionStore>,
        config: &QuireConfig,
    ) -> Self {
        Self {
            service,
            feed,
            suggestions,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            busy_delay: config.sweep_busy_delay,
            idle_delay: config.sweep_idle_delay,
        }
    }

    /// Start the sweep thread
    ///
    /// Returns `true` if a thread was spawned, `false` if the sweep was
    /// already running. The swap makes the check-and-set a single atomic
    /// step, so concurrent starts cannot double-spawn.
    pub fn start(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("sweep already running");
            return false;
        }

        info!("starting notification sweep");
        let service = self.service.clone();
        let feed = self.feed.clone();
        let suggestions = self.suggestions.clone();
        let running = self.running.clone();
        let busy_delay = self.busy_delay;
        let idle_delay = self.idle_delay;

        let handle = std::thread::Builder::new()
            .name("quire-sweep".to_string())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    let did_work = match sweep_pass(&service, &feed, &suggestions) {
                        Ok(n) => n > 0,
                        Err(e) => {
                            warn!("sweep pass failed: {}", e);
                            false
                        }
                    };
                    let delay = if did_work { busy_delay } else { idle_delay };
                    trace!(?delay, "sweep pass complete, sleeping");
                    sleep_while_running(&running, delay);
                }
                debug!("sweep thread exiting");
            });

        match handle {
            Ok(h) => {
                *self.handle.lock() = Some(h);
                true
            }
            Err(e) => {
                warn!("failed to spawn sweep thread: {}", e);
                self.running.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Stop the sweep thread and wait for it to exit
    ///
    /// Returns `true` if a running sweep was stopped. Safe to call from
    /// any thread; a second call is a no-op.
    pub fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        info!("stopping notification sweep");
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                warn!("sweep thread panicked before exit");
            }
        }
        true
    }

    /// Whether the sweep thread is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One pass over the feed; returns how many pairs were generated
fn sweep_pass(
    service: &SuggestionService,
    feed: &Arc<dyn NotificationFeed>,
    suggestions: &Arc<dyn SuggestionStore>,
) -> crate::error::Result<usize> {
    let mut generated = 0;
    for entry in feed.list_notifications()? {
        let ready = suggestions
            .get(entry.lesson_id, entry.notification_id)?
            .is_some_and(|s| s.is_ready());
        if ready {
            continue;
        }
        match service.generate_content(entry.lesson_id, entry.notification_id) {
            Ok(_) => {
                generated += 1;
                debug!(
                    lesson = %entry.lesson_id,
                    notification = %entry.notification_id,
                    "pre-generated suggestion content"
                );
            }
            // One bad pair must not stall the rest of the pass.
            Err(e) => warn!(
                lesson = %entry.lesson_id,
                notification = %entry.notification_id,
                "generation failed during sweep: {}", e
            ),
        }
    }
    Ok(generated)
}

/// Sleep in short slices so `stop()` is observed promptly
fn sleep_while_running(running: &AtomicBool, total: Duration) {
    let slice = Duration::from_millis(50);
    let mut remaining = total;
    while running.load(Ordering::SeqCst) && !remaining.is_zero() {
        let step = remaining.min(slice);
        std::thread::sleep(step);
        remaining -= step;
    }
}
