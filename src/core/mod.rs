pub mod error;
pub mod http;
pub mod observer;
pub mod provider;
pub mod resource;
pub mod state;
pub mod transport;

pub use error::{FetchError, ParseError};
pub use http::HttpTransport;
pub use observer::{ContentChange, StateChange, Subscribers, SubscriptionId};
pub use provider::ResourceProvider;
pub use resource::{HttpMethod, RequestDescription, Resource};
pub use state::FetchState;
pub use transport::{CancelHandle, CompletionFn, FailureFn, FetchHandle, ResourceTransport};
