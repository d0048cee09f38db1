use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{AbortHandle, Abortable};
use log::{debug, info, warn};
use reqwest::Client;
use tokio::runtime::Handle;
use url::Url;

use crate::core::error::FetchError;
use crate::core::resource::{HttpMethod, RequestDescription, Resource};
use crate::core::transport::{
    CancelHandle, CompletionFn, FailureFn, FetchHandle, ResourceTransport,
};

/// Transport backed by a shared reqwest client.
///
/// Request descriptions carry a symbolic `base_url_key`; the transport
/// resolves it against its registry and joins the request path. Each
/// fetch runs as an abortable task on the given runtime, so cancelling
/// the returned handle aborts the exchange and reports
/// `FetchError::Cancelled` through the error callback.
pub struct HttpTransport {
    client: Client,
    base_urls: HashMap<String, Url>,
    runtime: Handle,
}

impl HttpTransport {
    /// The runtime handle must outlive the transport's fetches; tasks
    /// are spawned onto it as requests come in.
    pub fn new(runtime: Handle) -> Self {
        Self::with_client(Client::new(), runtime)
    }

    pub fn with_client(client: Client, runtime: Handle) -> Self {
        Self {
            client,
            base_urls: HashMap::new(),
            runtime,
        }
    }

    /// Register the base URL that request descriptions reference through
    /// their `base_url_key`.
    pub fn register_base_url(&mut self, key: impl Into<String>, base: Url) {
        self.base_urls.insert(key.into(), base);
    }

    fn resolve(&self, request: &RequestDescription) -> Result<Url, FetchError> {
        let base = self.base_urls.get(&request.base_url_key).ok_or_else(|| {
            FetchError::transport(format!(
                "no base URL registered for key '{}'",
                request.base_url_key
            ))
        })?;
        base.join(&request.path).map_err(|err| {
            FetchError::transport(format!("invalid request path '{}': {err}", request.path))
        })
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

async fn fetch_bytes(client: Client, method: reqwest::Method, url: Url) -> Result<Vec<u8>, FetchError> {
    let response = client
        .request(method, url.clone())
        .send()
        .await
        .map_err(|err| FetchError::transport(format!("request to {url} failed: {err}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::transport(format!("{url} returned {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| FetchError::transport(format!("reading body from {url} failed: {err}")))?;
    Ok(bytes.to_vec())
}

struct AbortOnCancel {
    abort: AbortHandle,
}

impl CancelHandle for AbortOnCancel {
    fn cancel(&self) {
        debug!("aborting in-flight request");
        self.abort.abort();
    }
}

/// Handle for a request that settled before it could be issued.
struct SettledHandle;

impl CancelHandle for SettledHandle {
    fn cancel(&self) {}
}

impl<M: Send + 'static> ResourceTransport<M> for HttpTransport {
    fn request(
        &self,
        resource: &Resource<M>,
        on_completion: CompletionFn<M>,
        on_error: FailureFn,
    ) -> FetchHandle {
        let url = match self.resolve(resource.request()) {
            Ok(url) => url,
            Err(err) => {
                warn!("refusing fetch: {err}");
                on_error(err);
                return Arc::new(SettledHandle);
            }
        };

        info!("{} {url}", resource.request().method);
        let client = self.client.clone();
        let method = reqwest_method(resource.request().method);
        let resource = resource.clone();

        let (abort, registration) = AbortHandle::new_pair();
        let work = async move {
            let bytes = fetch_bytes(client, method, url).await?;
            resource.parse(&bytes).map_err(FetchError::from)
        };
        let abortable = Abortable::new(work, registration);
        self.runtime.spawn(async move {
            match abortable.await {
                Ok(Ok(model)) => on_completion(model),
                Ok(Err(err)) => on_error(err),
                Err(_aborted) => on_error(FetchError::Cancelled),
            }
        });

        Arc::new(AbortOnCancel { abort })
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    #[test]
    fn test_unknown_base_url_key_fails_synchronously() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let transport = HttpTransport::new(runtime.handle().clone());
        let resource: Resource<Vec<String>> =
            Resource::json(RequestDescription::get("/items", "unregistered"));

        let seen: Arc<Mutex<Option<FetchError>>> = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        transport.request(
            &resource,
            Box::new(|_| panic!("must not complete")),
            Box::new(move |err| *seen_clone.lock() = Some(err)),
        );

        match seen.lock().take() {
            Some(FetchError::Transport(msg)) => assert!(msg.contains("unregistered")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn test_base_url_resolution_joins_path() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut transport = HttpTransport::new(runtime.handle().clone());
        transport.register_base_url("api", Url::parse("http://example.test/v1/").unwrap());

        let resolved = transport
            .resolve(&RequestDescription::get("items", "api"))
            .unwrap();
        assert_eq!(resolved.as_str(), "http://example.test/v1/items");

        let absolute = transport
            .resolve(&RequestDescription::get("/other", "api"))
            .unwrap();
        assert_eq!(absolute.as_str(), "http://example.test/other");
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(reqwest_method(HttpMethod::Get), reqwest::Method::GET);
        assert_eq!(reqwest_method(HttpMethod::Post), reqwest::Method::POST);
        assert_eq!(reqwest_method(HttpMethod::Put), reqwest::Method::PUT);
        assert_eq!(reqwest_method(HttpMethod::Delete), reqwest::Method::DELETE);
    }
}
