//! Progress-callback trait for per-page batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::TopicConfigBuilder::progress_callback`] to receive events
//! as the batch driver works through the pages. The CLI uses this to drive
//! its progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use pdf_topics::{BatchProgressCallback, TopicConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: u32, total_pages: usize, ratio: f64) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} kept {:.0}%", page_num, total_pages, ratio * 100.0);
//!     }
//! }
//!
//! let config = TopicConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch driver as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first page.
    fn on_batch_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before topic extraction starts for a page.
    fn on_page_start(&self, page_num: u32, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page produced a record.
    ///
    /// # Arguments
    /// * `preservation_ratio` — final ratio of the accepted record
    fn on_page_complete(&self, page_num: u32, total_pages: usize, preservation_ratio: f64) {
        let _ = (page_num, total_pages, preservation_ratio);
    }

    /// Called when a page failed. Under the default abort policy this is the
    /// last event of the batch.
    fn on_page_error(&self, page_num: u32, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has a record.
    fn on_batch_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::TopicConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page_num: u32, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_num: u32, _total_pages: usize, _ratio: f64) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: u32, _total_pages: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(5);
        cb.on_page_start(1, 5);
        cb.on_page_complete(1, 5, 0.8);
        cb.on_page_error(2, 5, "some error");
        cb.on_batch_complete(5, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_page_start(1, 2);
        tracker.on_page_complete(1, 2, 0.75);
        tracker.on_page_start(2, 2);
        tracker.on_page_error(2, 2, "schema");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }
}
