//! Test doubles for driving the fetch state machine without a network.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::core::error::FetchError;
use crate::core::resource::{RequestDescription, Resource};
use crate::core::transport::{
    CancelHandle, CompletionFn, FailureFn, FetchHandle, ResourceTransport,
};

/// Handle double that records cancellation requests instead of acting on
/// them. Tests decide separately whether a cancellation error gets
/// delivered, mirroring a transport with cancellation latency.
pub struct MockHandle {
    cancel_count: AtomicUsize,
}

impl MockHandle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cancel_count: AtomicUsize::new(0),
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_count() > 0
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_count.load(Ordering::SeqCst)
    }
}

impl CancelHandle for MockHandle {
    fn cancel(&self) {
        self.cancel_count.fetch_add(1, Ordering::SeqCst);
    }
}

struct PendingRequest<M: 'static> {
    resource: Resource<M>,
    on_completion: CompletionFn<M>,
    on_error: FailureFn,
}

/// Deferred-firing transport double.
///
/// Records every request and lets the test fire its callbacks later
/// through [`complete`](Self::complete), [`complete_oldest`](Self::complete_oldest)
/// or [`fail`](Self::fail). Completion runs the resource's own parse
/// function over an empty payload, so canned resources (see
/// [`resource_with_result`]) deliver their configured model.
pub struct TransportMock<M: 'static> {
    pending: Mutex<VecDeque<PendingRequest<M>>>,
    next_handle: Mutex<Option<Arc<MockHandle>>>,
    request_count: AtomicUsize,
}

impl<M> TransportMock<M> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(VecDeque::new()),
            next_handle: Mutex::new(None),
            request_count: AtomicUsize::new(0),
        })
    }

    /// Total requests issued so far, including settled ones.
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Hand out this handle for the next request, so the test can watch
    /// it being cancelled.
    pub fn set_next_handle(&self, handle: Arc<MockHandle>) {
        *self.next_handle.lock() = Some(handle);
    }

    /// Parse an empty payload and fire the newest pending request's
    /// completion (or its error callback when parsing fails).
    ///
    /// Panics when no request is pending.
    pub fn complete(&self) {
        let request = self
            .pending
            .lock()
            .pop_back()
            .expect("no pending request to complete");
        Self::settle(request);
    }

    /// Like [`complete`](Self::complete), but fires the oldest pending
    /// request, modeling a late delivery from a request that has since
    /// been replaced by a newer one.
    pub fn complete_oldest(&self) {
        let request = self
            .pending
            .lock()
            .pop_front()
            .expect("no pending request to complete");
        Self::settle(request);
    }

    /// Fire the newest pending request's error callback.
    ///
    /// Panics when no request is pending.
    pub fn fail(&self, error: FetchError) {
        let request = self
            .pending
            .lock()
            .pop_back()
            .expect("no pending request to fail");
        (request.on_error)(error);
    }

    fn settle(request: PendingRequest<M>) {
        match request.resource.parse(&[]) {
            Ok(model) => (request.on_completion)(model),
            Err(err) => (request.on_error)(err.into()),
        }
    }
}

impl<M: Send + 'static> ResourceTransport<M> for TransportMock<M> {
    fn request(
        &self,
        resource: &Resource<M>,
        on_completion: CompletionFn<M>,
        on_error: FailureFn,
    ) -> FetchHandle {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().push_back(PendingRequest {
            resource: resource.clone(),
            on_completion,
            on_error,
        });
        self.next_handle.lock().take().unwrap_or_else(MockHandle::new)
    }
}

/// Resource whose parser ignores the payload and yields `result`.
pub fn resource_with_result<M>(result: M) -> Resource<M>
where
    M: Clone + Send + Sync + 'static,
{
    Resource::new(RequestDescription::get("/fixture", "fixture"), move |_| {
        Ok(result.clone())
    })
}
