use std::cmp::Ordering;
use std::mem;
use std::sync::{Arc, Weak};

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::core::error::FetchError;
use crate::core::observer::{ContentChange, StateChange, Subscribers, SubscriptionId};
use crate::core::resource::Resource;
use crate::core::state::FetchState;
use crate::core::transport::{FetchHandle, ResourceTransport};

type SortFn<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Fetches a remote resource through a transport collaborator and
/// republishes the parsed result as observable grouped-list content.
///
/// At most one fetch is in flight at a time: every `load` cancels the
/// previous operation before issuing a new one, and callbacks belonging
/// to a superseded operation are ignored. The provider is a cheap
/// handle over shared interior; clones observe and drive the same
/// content. All methods are synchronous and non-blocking.
pub struct ResourceProvider<T: 'static> {
    shared: Arc<Shared<T>>,
}

struct Shared<T: 'static> {
    transport: Arc<dyn ResourceTransport<Vec<Vec<T>>>>,
    state_observers: Subscribers<StateChange>,
    content_observers: Subscribers<ContentChange>,
    inner: Mutex<Inner<T>>,
}

struct Inner<T: 'static> {
    resource: Option<Resource<Vec<Vec<T>>>>,
    contents: Vec<Vec<T>>,
    state: FetchState,
    state_before_load: FetchState,
    in_flight: Option<FetchHandle>,
    sort_by: Option<SortFn<T>>,
    // Identifies the load a transport callback belongs to. Callbacks
    // carrying a stale generation are dropped.
    generation: u64,
    // The current generation already completed or failed; set when a
    // transport fires a callback before `request` even returns.
    settled: bool,
}

/// Deferred observer notification, dispatched after the interior lock is
/// released so handlers may reenter the provider.
enum Notification {
    State(StateChange),
    Content,
}

impl<T: Send + 'static> ResourceProvider<T> {
    /// Provider with no resource configured. Initial state is `Empty`.
    pub fn new(transport: Arc<dyn ResourceTransport<Vec<Vec<T>>>>) -> Self {
        Self::with_prefetched(transport, None, Vec::new())
    }

    /// Provider with a resource configured but not yet loaded.
    /// Construction never performs network I/O; call `load` to fetch.
    pub fn with_resource(
        transport: Arc<dyn ResourceTransport<Vec<Vec<T>>>>,
        resource: Resource<Vec<Vec<T>>>,
    ) -> Self {
        Self::with_prefetched(transport, Some(resource), Vec::new())
    }

    /// Provider seeded with content known ahead of any fetch, as a
    /// single section. Non-empty prefetched content makes the initial
    /// state `Success` instead of `Empty`.
    pub fn with_prefetched(
        transport: Arc<dyn ResourceTransport<Vec<Vec<T>>>>,
        resource: Option<Resource<Vec<Vec<T>>>>,
        prefetched: Vec<T>,
    ) -> Self {
        let (contents, state) = if prefetched.is_empty() {
            (Vec::new(), FetchState::Empty)
        } else {
            (vec![prefetched], FetchState::Success)
        };
        Self {
            shared: Arc::new(Shared {
                transport,
                state_observers: Subscribers::new(),
                content_observers: Subscribers::new(),
                inner: Mutex::new(Inner {
                    resource,
                    contents,
                    state_before_load: state.clone(),
                    state,
                    in_flight: None,
                    sort_by: None,
                    generation: 0,
                    settled: false,
                }),
            }),
        }
    }

    /// Replace the configured resource and immediately reload. `None`
    /// clears the stored content, so the reload resolves to `Empty`.
    ///
    /// With `skip_loading_state` the reload stays out of the `Loading`
    /// state; consumers learn about completion through the content
    /// notification instead. That keeps silent background refreshes from
    /// flashing a loading indicator.
    pub fn reconfigure(&self, resource: Option<Resource<Vec<Vec<T>>>>, skip_loading_state: bool) {
        {
            let mut inner = self.shared.inner.lock();
            if resource.is_none() {
                inner.contents = Vec::new();
            }
            inner.resource = resource;
        }
        self.load(skip_loading_state);
    }

    /// `reconfigure` for a flat-list resource; the model is reshaped
    /// into a single section.
    pub fn reconfigure_list(&self, resource: Option<Resource<Vec<T>>>, skip_loading_state: bool) {
        self.reconfigure(resource.map(Resource::into_sections), skip_loading_state);
    }

    /// Fetch the configured resource, cancelling any fetch still in
    /// flight. Without a configured resource the provider resolves to
    /// `Empty` and no request is issued.
    pub fn load(&self, skip_loading_state: bool) {
        Shared::load(&self.shared, skip_loading_state);
    }

    /// Drop the configured resource and all content. Settles in `Empty`.
    pub fn clear(&self) {
        {
            let mut inner = self.shared.inner.lock();
            inner.resource = None;
            inner.contents = Vec::new();
        }
        self.load(false);
    }

    pub fn state(&self) -> FetchState {
        self.shared.inner.lock().state.clone()
    }

    /// Snapshot of the current content, as sections of items.
    pub fn contents(&self) -> Vec<Vec<T>>
    where
        T: Clone,
    {
        self.shared.inner.lock().contents.clone()
    }

    pub fn section_count(&self) -> usize {
        self.shared.inner.lock().contents.len()
    }

    pub fn item_count(&self, section: usize) -> usize {
        self.shared
            .inner
            .lock()
            .contents
            .get(section)
            .map_or(0, Vec::len)
    }

    pub fn item_at(&self, section: usize, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.shared
            .inner
            .lock()
            .contents
            .get(section)
            .and_then(|items| items.get(index))
            .cloned()
    }

    /// Order freshly fetched content with `compare`, per section.
    /// Existing content, including prefetched seeds, is not re-sorted.
    pub fn set_sort_by(&self, compare: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) {
        self.shared.inner.lock().sort_by = Some(Arc::new(compare));
    }

    pub fn clear_sort_by(&self) {
        self.shared.inner.lock().sort_by = None;
    }

    /// Observe state transitions. The callback receives the old and new
    /// state and may call back into the provider, including
    /// (un)subscribing.
    pub fn subscribe_state_changes(
        &self,
        callback: impl Fn(&StateChange) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.shared.state_observers.subscribe(callback)
    }

    pub fn unsubscribe_state_changes(&self, id: SubscriptionId) -> bool {
        self.shared.state_observers.unsubscribe(id)
    }

    /// Observe content snapshot replacements.
    pub fn subscribe_content_changes(
        &self,
        callback: impl Fn(&ContentChange) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.shared.content_observers.subscribe(callback)
    }

    pub fn unsubscribe_content_changes(&self, id: SubscriptionId) -> bool {
        self.shared.content_observers.unsubscribe(id)
    }
}

impl<T> Clone for ResourceProvider<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + 'static> Shared<T> {
    fn load(shared: &Arc<Self>, skip_loading_state: bool) {
        let mut pending = Vec::new();
        let (superseded, job) = {
            let mut inner = shared.inner.lock();
            inner.state_before_load = inner.state.clone();
            inner.generation += 1;
            inner.settled = false;
            let superseded = inner.in_flight.take();
            match inner.resource.clone() {
                None => {
                    Self::set_state(&mut inner, FetchState::Empty, &mut pending);
                    pending.push(Notification::Content);
                    (superseded, None)
                }
                Some(resource) => (superseded, Some((resource, inner.generation))),
            }
        };

        if let Some(handle) = superseded {
            debug!("cancelling superseded fetch");
            handle.cancel();
        }
        let Some((resource, generation)) = job else {
            shared.dispatch(pending);
            return;
        };

        info!(
            "loading {} {}",
            resource.request().method,
            resource.request().path
        );
        let weak = Arc::downgrade(shared);
        let on_completion = {
            let weak = Weak::clone(&weak);
            Box::new(move |model: Vec<Vec<T>>| {
                if let Some(shared) = weak.upgrade() {
                    shared.complete(generation, model);
                }
            })
        };
        let on_error = Box::new(move |error: FetchError| {
            if let Some(shared) = weak.upgrade() {
                shared.fail(generation, error);
            }
        });
        let handle = shared.transport.request(&resource, on_completion, on_error);

        let mut untracked = None;
        {
            let mut inner = shared.inner.lock();
            if inner.generation != generation {
                // Another load raced in while the transport was being
                // invoked; nobody tracks this handle anymore.
                untracked = Some(handle);
            } else if !inner.settled {
                inner.in_flight = Some(Arc::clone(&handle));
                if !skip_loading_state {
                    Self::set_state(&mut inner, FetchState::Loading(handle), &mut pending);
                }
            }
        }
        if let Some(handle) = untracked {
            handle.cancel();
        }
        shared.dispatch(pending);
    }

    fn complete(&self, generation: u64, mut model: Vec<Vec<T>>) {
        let mut pending = Vec::new();
        {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                debug!("ignoring completion of superseded fetch");
                return;
            }
            inner.settled = true;
            inner.in_flight = None;
            if let Some(sort_by) = &inner.sort_by {
                for section in &mut model {
                    section.sort_by(|a, b| sort_by(a, b));
                }
            }
            inner.contents = model;
            Self::set_state(&mut inner, FetchState::Success, &mut pending);
            pending.push(Notification::Content);
        }
        info!("fetch completed");
        self.dispatch(pending);
    }

    fn fail(&self, generation: u64, error: FetchError) {
        let mut pending = Vec::new();
        {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                debug!("ignoring failure of superseded fetch: {error}");
                return;
            }
            inner.settled = true;
            inner.in_flight = None;
            if error.is_cancellation() {
                // The fetch was cancelled rather than superseded: settle
                // back into whatever the provider showed before this
                // load started.
                let revert = inner.state_before_load.clone();
                Self::set_state(&mut inner, revert, &mut pending);
            } else {
                warn!("fetch failed: {error}");
                Self::set_state(&mut inner, FetchState::Error(error), &mut pending);
            }
        }
        self.dispatch(pending);
    }

    fn set_state(inner: &mut Inner<T>, new: FetchState, pending: &mut Vec<Notification>) {
        let old = mem::replace(&mut inner.state, new.clone());
        pending.push(Notification::State(StateChange { old, new }));
    }

    fn dispatch(&self, pending: Vec<Notification>) {
        for notification in pending {
            match notification {
                Notification::State(change) => self.state_observers.notify(&change),
                Notification::Content => self.content_observers.notify(&ContentChange),
            }
        }
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.inner.get_mut().in_flight.take() {
            handle.cancel();
        }
    }
}
