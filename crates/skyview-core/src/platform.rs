//! Platform abstraction for the skyview runtime.
//!
//! The runtime never drives itself: it tells the host that work is pending
//! and the host calls back into [`crate::Runtime::flush`] on its own thread.

/// Notifies the host that the runtime has queued effects or tasks.
///
/// Implementations only need to remember or forward the request; the host
/// loop decides when to flush.
pub trait RuntimeScheduler {
    /// Request that the host flush the runtime at its next opportunity.
    fn request_flush(&self);
}
