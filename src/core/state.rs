use std::fmt;
use std::mem;

use crate::core::error::FetchError;
use crate::core::transport::FetchHandle;

/// Observable lifecycle of the most recent fetch.
///
/// Exactly one of `is_empty`/`is_loading`/`has_error`/`has_succeeded` is
/// true at any time. Equality compares the variant only, so two
/// `Loading` states with different handles (or two `Error` states with
/// different errors) compare equal.
#[derive(Clone)]
pub enum FetchState {
    /// Nothing has been requested yet, or the provider was cleared.
    Empty,
    /// A fetch is in flight. The payload can be used to cancel it.
    Loading(FetchHandle),
    /// The most recent fetch completed and content is current. An empty
    /// result is still `Success`, not `Empty`.
    Success,
    /// The most recent fetch failed with a non-cancellation error.
    Error(FetchError),
}

impl FetchState {
    pub fn is_empty(&self) -> bool {
        matches!(self, FetchState::Empty)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading(_))
    }

    pub fn has_error(&self) -> bool {
        matches!(self, FetchState::Error(_))
    }

    pub fn has_succeeded(&self) -> bool {
        matches!(self, FetchState::Success)
    }

    /// Handle of the in-flight operation, if loading.
    pub fn loading_handle(&self) -> Option<&FetchHandle> {
        match self {
            FetchState::Loading(handle) => Some(handle),
            _ => None,
        }
    }

    /// The error payload, if any.
    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchState::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl PartialEq for FetchState {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl fmt::Debug for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchState::Empty => f.write_str("Empty"),
            FetchState::Loading(_) => f.write_str("Loading"),
            FetchState::Success => f.write_str("Success"),
            FetchState::Error(err) => f.debug_tuple("Error").field(err).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::transport::CancelHandle;

    struct InertHandle;

    impl CancelHandle for InertHandle {
        fn cancel(&self) {}
    }

    fn loading() -> FetchState {
        FetchState::Loading(Arc::new(InertHandle))
    }

    fn assert_exactly_one_predicate(state: &FetchState) {
        let flags = [
            state.is_empty(),
            state.is_loading(),
            state.has_error(),
            state.has_succeeded(),
        ];
        assert_eq!(flags.iter().filter(|f| **f).count(), 1, "state {state:?}");
    }

    #[test]
    fn test_predicates_are_mutually_exclusive() {
        assert_exactly_one_predicate(&FetchState::Empty);
        assert_exactly_one_predicate(&loading());
        assert_exactly_one_predicate(&FetchState::Success);
        assert_exactly_one_predicate(&FetchState::Error(FetchError::transport("boom")));
    }

    #[test]
    fn test_equality_compares_variant_only() {
        assert_eq!(loading(), loading());
        assert_eq!(
            FetchState::Error(FetchError::transport("a")),
            FetchState::Error(FetchError::transport("b"))
        );
        assert_ne!(FetchState::Empty, FetchState::Success);
        assert_ne!(loading(), FetchState::Success);
    }

    #[test]
    fn test_payload_accessors() {
        let state = loading();
        assert!(state.loading_handle().is_some());
        assert!(state.error().is_none());

        let failed = FetchState::Error(FetchError::Cancelled);
        assert!(failed.loading_handle().is_none());
        assert_eq!(failed.error(), Some(&FetchError::Cancelled));
    }
}
