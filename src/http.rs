//! Transport primitives for provider discovery and token exchanges.
//!
//! The module exposes [`DiscoveryHttpClient`], the crate's only dependency on
//! an HTTP stack. Discovery issues two kinds of requests: side-effect-free
//! capability probes (HEAD, headers only) and document fetches (GET with an
//! `Accept` header). Both return plain data structs so implementations stay
//! decoupled from any particular HTTP client.

// crates.io
#[cfg(feature = "reqwest")] use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")] use reqwest::header::{ACCEPT, LINK};
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`DiscoveryHttpClient`] implementations.
pub type HttpFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// Outcome of a capability probe: status plus any `Link` response headers.
#[derive(Clone, Debug, Default)]
pub struct ProbeResponse {
	/// HTTP status code returned by the probed resource.
	pub status: u16,
	/// Raw `Link` header values, in response order.
	pub link_headers: Vec<String>,
}
impl ProbeResponse {
	/// Returns true for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Outcome of a document fetch: status plus the response body.
#[derive(Clone, Debug, Default)]
pub struct DocumentResponse {
	/// HTTP status code returned by the fetched resource.
	pub status: u16,
	/// Response body decoded as text.
	pub body: String,
}
impl DocumentResponse {
	/// Returns true for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP transports capable of running the discovery wire
/// contract.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared
/// behind `Arc<dyn DiscoveryHttpClient>` across flows without additional
/// wrappers. Probes must not carry a body and must not follow non-HTTP
/// redirect schemes; transport-level failures map into [`TransportError`]
/// while non-success statuses surface through the response structs so callers
/// can distinguish "unreachable" from "reachable but silent".
pub trait DiscoveryHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Issues a side-effect-free capability request against `url`.
	fn probe(&self, url: &Url) -> HttpFuture<'_, ProbeResponse>;

	/// Fetches `url` as a document, advertising `accept` as the preferred
	/// media type.
	fn fetch_document<'a>(&'a self, url: &'a Url, accept: &'a str)
	-> HttpFuture<'a, DocumentResponse>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one
/// place. The same client backs discovery probes and, via
/// [`ExchangeHttpHandle`], the `oauth2` code exchange; configure custom
/// clients to not follow redirects on token requests, because token endpoints
/// return results directly instead of delegating to another URI.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds an [`ExchangeHttpHandle`] sharing this wrapper's connection pool.
	pub fn exchange_handle(&self) -> ExchangeHttpHandle {
		ExchangeHttpHandle(self.0.clone())
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl DiscoveryHttpClient for ReqwestHttpClient {
	fn probe(&self, url: &Url) -> HttpFuture<'_, ProbeResponse> {
		let client = self.0.clone();
		let url = url.clone();

		Box::pin(async move {
			let response = client.head(url).send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let link_headers = response
				.headers()
				.get_all(LINK)
				.iter()
				.filter_map(|value| value.to_str().ok().map(str::to_owned))
				.collect();

			Ok(ProbeResponse { status, link_headers })
		})
	}

	fn fetch_document<'a>(
		&'a self,
		url: &'a Url,
		accept: &'a str,
	) -> HttpFuture<'a, DocumentResponse> {
		let client = self.0.clone();
		let url = url.clone();
		let accept = accept.to_owned();

		Box::pin(async move {
			let response = client
				.get(url)
				.header(ACCEPT, accept)
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.text().await.map_err(TransportError::from)?;

			Ok(DocumentResponse { status, body })
		})
	}
}

#[cfg(feature = "reqwest")]
/// [`AsyncHttpClient`] adapter handed to the `oauth2` crate for code
/// exchanges.
#[derive(Clone)]
pub struct ExchangeHttpHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ExchangeHttpHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
