//! Fetches remote resources and republishes them as observable list
//! content.
//!
//! The centerpiece is [`ResourceProvider`]: it owns one in-flight fetch
//! at a time, moves through the `Empty`/`Loading`/`Success`/`Error`
//! states of [`FetchState`], and notifies subscribers when its state or
//! its grouped-list content snapshot changes. A [`Resource`] pairs the
//! description of what to fetch with a parser from raw bytes into the
//! typed model; a [`ResourceTransport`] executes the exchange and can be
//! anything from the bundled [`HttpTransport`] to a test double.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use listsource::{HttpTransport, RequestDescription, Resource, ResourceProvider};
//! use url::Url;
//!
//! # #[derive(Clone, serde::Deserialize)] struct Station { name: String }
//! # fn main() -> Result<(), url::ParseError> {
//! # let runtime = tokio::runtime::Runtime::new().unwrap();
//! let mut transport = HttpTransport::new(runtime.handle().clone());
//! transport.register_base_url("api", Url::parse("https://api.example.test/")?);
//!
//! let stations: Resource<Vec<Station>> =
//!     Resource::json(RequestDescription::get("stations", "api"));
//!
//! let provider: ResourceProvider<Station> = ResourceProvider::new(Arc::new(transport));
//! provider.subscribe_content_changes(|_| {
//!     // refresh the visible list
//! });
//! provider.reconfigure_list(Some(stations), false);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod test_fixtures;

pub use crate::core::{
    CancelHandle, CompletionFn, ContentChange, FailureFn, FetchError, FetchHandle, FetchState,
    HttpMethod, HttpTransport, ParseError, RequestDescription, Resource, ResourceProvider,
    ResourceTransport, StateChange, Subscribers, SubscriptionId,
};
