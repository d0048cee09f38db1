use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::core::error::ParseError;

/// HTTP verb carried by a request description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-agnostic description of the request to issue.
///
/// The provider treats this as an opaque value; only a transport
/// interprets it. `base_url_key` is a symbolic name the transport
/// resolves to a concrete base URL, so resources stay portable across
/// environments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescription {
    pub method: HttpMethod,
    pub path: String,
    pub base_url_key: String,
}

impl RequestDescription {
    pub fn new(
        method: HttpMethod,
        path: impl Into<String>,
        base_url_key: impl Into<String>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            base_url_key: base_url_key.into(),
        }
    }

    /// GET request, the common case for list content.
    pub fn get(path: impl Into<String>, base_url_key: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path, base_url_key)
    }
}

type ParseFn<M> = Arc<dyn Fn(&[u8]) -> Result<M, ParseError> + Send + Sync>;

/// Pairs a request description with a parser from raw bytes to the typed
/// model `M`.
///
/// Cloning is cheap; clones share the parse function.
pub struct Resource<M: 'static> {
    request: RequestDescription,
    parse: ParseFn<M>,
}

impl<M> Clone for Resource<M> {
    fn clone(&self) -> Self {
        Self {
            request: self.request.clone(),
            parse: Arc::clone(&self.parse),
        }
    }
}

impl<M> fmt::Debug for Resource<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl<M> Resource<M> {
    pub fn new(
        request: RequestDescription,
        parse: impl Fn(&[u8]) -> Result<M, ParseError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            request,
            parse: Arc::new(parse),
        }
    }

    pub fn request(&self) -> &RequestDescription {
        &self.request
    }

    /// Run the parser over received bytes.
    pub fn parse(&self, bytes: &[u8]) -> Result<M, ParseError> {
        (self.parse)(bytes)
    }

    /// Derive a resource for a different model by post-processing the
    /// parsed value. The request description is unchanged.
    pub fn map<N: 'static>(
        self,
        transform: impl Fn(M) -> N + Send + Sync + 'static,
    ) -> Resource<N> {
        let parse = Arc::clone(&self.parse);
        Resource {
            request: self.request,
            parse: Arc::new(move |bytes| parse(bytes).map(&transform)),
        }
    }
}

impl<M: DeserializeOwned> Resource<M> {
    /// Resource whose payload is JSON decoded straight into `M`.
    pub fn json(request: RequestDescription) -> Self {
        Self::new(request, |bytes| {
            serde_json::from_slice(bytes).map_err(ParseError::from)
        })
    }
}

impl<T: 'static> Resource<Vec<T>> {
    /// Reshape a flat list model into the grouped-list form the provider
    /// consumes, as a single section.
    pub fn into_sections(self) -> Resource<Vec<Vec<T>>> {
        self.map(|items| vec![items])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_resource_decodes_payload() {
        let resource: Resource<Vec<String>> =
            Resource::json(RequestDescription::get("/names", "api"));

        let parsed = resource.parse(br#"["a","b"]"#).unwrap();
        assert_eq!(parsed, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_json_resource_reports_malformed_payload() {
        let resource: Resource<Vec<String>> =
            Resource::json(RequestDescription::get("/names", "api"));

        assert!(resource.parse(b"{broken").is_err());
    }

    #[test]
    fn test_map_transforms_parsed_model() {
        let resource: Resource<Vec<u32>> = Resource::json(RequestDescription::get("/nums", "api"));
        let doubled = resource.map(|nums| nums.into_iter().map(|n| n * 2).collect::<Vec<_>>());

        assert_eq!(doubled.parse(b"[1,2,3]").unwrap(), vec![2, 4, 6]);
    }

    #[test]
    fn test_into_sections_wraps_flat_list() {
        let resource: Resource<Vec<u32>> = Resource::json(RequestDescription::get("/nums", "api"));
        let sectioned = resource.into_sections();

        assert_eq!(sectioned.parse(b"[7,8]").unwrap(), vec![vec![7, 8]]);
    }

    #[test]
    fn test_request_description_accessors() {
        let request = RequestDescription::get("/v1/items", "backend");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.method.as_str(), "GET");
        assert_eq!(request.path, "/v1/items");
        assert_eq!(request.base_url_key, "backend");
    }
}
