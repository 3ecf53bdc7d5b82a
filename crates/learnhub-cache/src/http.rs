//! Conditional GET support for public read endpoints.
//!
//! ```ignore
//! Router::new()
//!     .route("/showcase", get(list_showcase))
//!     .layer(cache_control(CacheControl::public(60)))
//!     .layer(axum::middleware::from_fn(etag_middleware));
//! ```

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderValue, Method, StatusCode,
        header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use sha2::{Digest, Sha256};
use tower_http::set_header::{MakeHeaderValue, SetResponseHeaderLayer};

/// `Cache-Control` policy for a group of routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheControl {
    Public {
        max_age: u64,
        stale_while_revalidate: Option<u64>,
    },
    Private {
        max_age: u64,
    },
    NoStore,
}

impl CacheControl {
    pub fn public(max_age: u64) -> Self {
        Self::Public {
            max_age,
            stale_while_revalidate: None,
        }
    }

    pub fn private(max_age: u64) -> Self {
        Self::Private { max_age }
    }

    pub fn with_stale_while_revalidate(self, seconds: u64) -> Self {
        match self {
            Self::Public { max_age, .. } => Self::Public {
                max_age,
                stale_while_revalidate: Some(seconds),
            },
            other => other,
        }
    }

    pub fn header_value(&self) -> HeaderValue {
        let value = match self {
            Self::Public {
                max_age,
                stale_while_revalidate: Some(swr),
            } => format!("public, max-age={}, stale-while-revalidate={}", max_age, swr),
            Self::Public { max_age, .. } => format!("public, max-age={}", max_age),
            Self::Private { max_age } => format!("private, max-age={}", max_age),
            Self::NoStore => "no-store".to_string(),
        };

        HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("no-store"))
    }
}

#[derive(Clone)]
pub struct CacheControlHeader(HeaderValue);

impl<B> MakeHeaderValue<Response<B>> for CacheControlHeader {
    fn make_header_value(&mut self, response: &Response<B>) -> Option<HeaderValue> {
        // Errors are never cacheable.
        if response.status().is_success() || response.status() == StatusCode::NOT_MODIFIED {
            Some(self.0.clone())
        } else {
            Some(HeaderValue::from_static("no-store"))
        }
    }
}

/// Set `Cache-Control` on responses that don't already carry one.
pub fn cache_control(policy: CacheControl) -> SetResponseHeaderLayer<CacheControlHeader> {
    SetResponseHeaderLayer::if_not_present(CACHE_CONTROL, CacheControlHeader(policy.header_value()))
}

fn generate_etag(body: &[u8]) -> String {
    let hash = Sha256::digest(body);
    format!("\"{}\"", hex::encode(&hash[..16]))
}

/// `If-None-Match` may list several tags, or `*`. Weak tags compare equal.
fn if_none_match_satisfied(header: &str, etag: &str) -> bool {
    let etag = etag.trim_start_matches("W/");
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.trim_start_matches("W/") == etag
    })
}

/// Hash successful GET bodies into an `ETag` and answer `304 Not Modified`
/// when the client already holds that version. Buffers the full body.
pub async fn etag_middleware(request: Request, next: Next) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let if_none_match = request
        .headers()
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer response body for ETag");
            return (StatusCode::INTERNAL_SERVER_ERROR, Body::empty()).into_response();
        }
    };

    let etag = generate_etag(&bytes);
    let Ok(etag_value) = HeaderValue::from_str(&etag) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    if if_none_match.is_some_and(|header| if_none_match_satisfied(&header, &etag)) {
        let mut not_modified = StatusCode::NOT_MODIFIED.into_response();
        not_modified.headers_mut().insert(ETAG, etag_value);
        return not_modified;
    }

    parts.headers.insert(ETAG, etag_value);
    Response::from_parts(parts, Body::from(bytes))
}
