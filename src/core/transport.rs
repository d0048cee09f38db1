use std::sync::Arc;

use crate::core::error::FetchError;
use crate::core::resource::Resource;

/// A cancellable, in-flight fetch operation.
///
/// Cancellation is cooperative: `cancel` is a request, not a guarantee
/// that no callback will fire. A cancelled operation either stays silent
/// or reports `FetchError::Cancelled` through its error callback.
pub trait CancelHandle: Send + Sync {
    fn cancel(&self);
}

/// Shared handle to one in-flight operation.
pub type FetchHandle = Arc<dyn CancelHandle>;

/// Completion callback, invoked with the parsed model.
pub type CompletionFn<M> = Box<dyn FnOnce(M) + Send>;

/// Failure callback, invoked with the classified error.
pub type FailureFn = Box<dyn FnOnce(FetchError) + Send>;

/// Collaborator that executes one fetch-and-parse per call.
///
/// Implementations must invoke exactly one of `on_completion`/`on_error`
/// per request, unless the returned handle is cancelled before either
/// fires; a cancelled request may stay silent or report
/// `FetchError::Cancelled`. Callbacks may be invoked from any thread,
/// including synchronously from within `request` itself.
pub trait ResourceTransport<M: 'static>: Send + Sync {
    fn request(
        &self,
        resource: &Resource<M>,
        on_completion: CompletionFn<M>,
        on_error: FailureFn,
    ) -> FetchHandle;
}
