//! Decorating an outgoing-request primitive with stored UTM parameters

use crate::keeper::UtmKeeper;
use url::Url;
use utm_keeper_params::ParameterSet;

/// A request as a structured descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl RequestDescriptor {
    /// GET request for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// The three accepted shapes of request target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    Url(String),
    Parsed(Url),
    Request(RequestDescriptor),
}

impl RequestTarget {
    pub fn url(&self) -> &str {
        match self {
            RequestTarget::Url(url) => url,
            RequestTarget::Parsed(url) => url.as_str(),
            RequestTarget::Request(request) => &request.url,
        }
    }
}

impl From<&str> for RequestTarget {
    fn from(url: &str) -> Self {
        RequestTarget::Url(url.to_string())
    }
}

impl From<String> for RequestTarget {
    fn from(url: String) -> Self {
        RequestTarget::Url(url)
    }
}

impl From<Url> for RequestTarget {
    fn from(url: Url) -> Self {
        RequestTarget::Parsed(url)
    }
}

impl From<RequestDescriptor> for RequestTarget {
    fn from(request: RequestDescriptor) -> Self {
        RequestTarget::Request(request)
    }
}

/// Options the underlying dispatcher receives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    pub method: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// Options accepted by [`UtmDispatch::call`].
///
/// `skip_utm` is consumed by the decorator; only `dispatch` is forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub skip_utm: bool,
    pub dispatch: DispatchOptions,
}

impl RequestOptions {
    pub fn skipping_utm() -> Self {
        Self {
            skip_utm: true,
            ..Default::default()
        }
    }
}

impl From<DispatchOptions> for RequestOptions {
    fn from(dispatch: DispatchOptions) -> Self {
        Self {
            skip_utm: false,
            dispatch,
        }
    }
}

/// An outgoing-request primitive. `Output` may be a response or a future of one.
pub trait Dispatch {
    type Output;

    fn dispatch(&self, target: RequestTarget, options: DispatchOptions) -> Self::Output;
}

impl<F, R> Dispatch for F
where
    F: Fn(RequestTarget, DispatchOptions) -> R,
{
    type Output = R;

    fn dispatch(&self, target: RequestTarget, options: DispatchOptions) -> R {
        self(target, options)
    }
}

/// Dispatcher wrapper that appends stored UTM parameters to each target.
///
/// Parameters are read when the call is made, before delegating, so the
/// rewrite never waits on the inner dispatcher.
pub struct UtmDispatch<D> {
    keeper: UtmKeeper,
    inner: D,
}

impl<D: Dispatch> UtmDispatch<D> {
    pub fn new(keeper: UtmKeeper, inner: D) -> Self {
        Self { keeper, inner }
    }

    pub fn call(&self, target: impl Into<RequestTarget>, options: &RequestOptions) -> D::Output {
        let target = target.into();
        let forwarded = options.dispatch.clone();

        if options.skip_utm || !self.keeper.persistence_available() {
            return self.inner.dispatch(target, forwarded);
        }

        let target = match self.keeper.get_params() {
            Some(params) => self.rewrite(target, &params),
            None => target,
        };
        self.inner.dispatch(target, forwarded)
    }

    fn rewrite(&self, target: RequestTarget, params: &ParameterSet) -> RequestTarget {
        match target {
            RequestTarget::Url(url) => RequestTarget::Url(self.keeper.append_params(&url, params)),
            RequestTarget::Parsed(url) => {
                let appended = self.keeper.append_params(url.as_str(), params);
                match Url::parse(&appended) {
                    Ok(parsed) => RequestTarget::Parsed(parsed),
                    Err(_) => RequestTarget::Parsed(url),
                }
            }
            RequestTarget::Request(mut request) => {
                request.url = self.keeper.append_params(&request.url, params);
                RequestTarget::Request(request)
            }
        }
    }
}

impl<D: Dispatch> Dispatch for UtmDispatch<D> {
    type Output = D::Output;

    fn dispatch(&self, target: RequestTarget, options: DispatchOptions) -> D::Output {
        self.call(target, &RequestOptions::from(options))
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_dispatch {
    use super::{Dispatch, DispatchOptions, RequestTarget};
    use std::future::Future;
    use std::pin::Pin;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum ReqwestDispatchError {
        #[error("invalid HTTP method {0:?}")]
        InvalidMethod(String),

        #[error(transparent)]
        Http(#[from] reqwest::Error),
    }

    pub type ResponseFuture =
        Pin<Box<dyn Future<Output = Result<reqwest::Response, ReqwestDispatchError>> + Send>>;

    /// [`Dispatch`] over a `reqwest::Client`
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestDispatcher {
        client: reqwest::Client,
    }

    impl ReqwestDispatcher {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl Dispatch for ReqwestDispatcher {
        type Output = ResponseFuture;

        fn dispatch(&self, target: RequestTarget, options: DispatchOptions) -> ResponseFuture {
            let (url, method, mut headers, body) = match target {
                RequestTarget::Url(url) => (url, None, Vec::new(), None),
                RequestTarget::Parsed(url) => (url.to_string(), None, Vec::new(), None),
                RequestTarget::Request(request) => (
                    request.url,
                    Some(request.method),
                    request.headers,
                    request.body,
                ),
            };
            // explicit options win over the descriptor
            let method = options.method.or(method).unwrap_or_else(|| "GET".to_string());
            headers.extend(options.headers);
            let body = options.body.or(body);

            let method = match reqwest::Method::from_bytes(method.as_bytes()) {
                Ok(method) => method,
                Err(_) => {
                    return Box::pin(async move {
                        Err::<reqwest::Response, _>(ReqwestDispatchError::InvalidMethod(method))
                    });
                }
            };

            let mut builder = self.client.request(method, url);
            for (name, value) in headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = body {
                builder = builder.body(body);
            }

            Box::pin(async move { builder.send().await.map_err(ReqwestDispatchError::from) })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_dispatch::{ReqwestDispatchError, ReqwestDispatcher, ResponseFuture};
