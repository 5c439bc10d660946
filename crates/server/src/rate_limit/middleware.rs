use super::RateLimiter;
use axum::extract::{ConnectInfo, OriginalUri, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;

/// Best-effort client address: the first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then `X-Client-IP`, then the socket peer, else `"unknown"`.
///
/// Headers are trusted as sent; anyone can spoof them to dodge a limit.
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header("x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            return first.trim().to_string();
        }
    }

    header("x-real-ip")
        .or_else(|| header("x-client-ip"))
        .map(str::to_string)
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Axum middleware applying `limiter` to every request of the router it wraps.
///
/// The route part of the key is the full request path, including any prefix
/// stripped by `nest`.
pub async fn enforce_rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let route = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let ip = client_ip(request.headers(), remote);

    if let Some(rejection) = limiter.check(&ip, &route) {
        tracing::warn!(
            name = "rate_limit.rejected",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            client_ip = %ip,
            route = %route,
            limit = rejection.limit,
            retry_after = rejection.retry_after_secs,
            message = "Request rejected by rate limiter"
        );
        return rejection.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn forwarded_for_first_hop_wins() {
        let h = headers(&[
            ("x-forwarded-for", " 203.0.113.7 , 10.0.0.1"),
            ("x-real-ip", "198.51.100.1"),
        ]);
        assert_eq!(client_ip(&h, None), "203.0.113.7");
    }

    #[test]
    fn falls_back_through_headers_then_socket() {
        let h = headers(&[("x-client-ip", "198.51.100.9")]);
        assert_eq!(client_ip(&h, None), "198.51.100.9");

        let h = headers(&[("x-real-ip", "198.51.100.1"), ("x-client-ip", "198.51.100.9")]);
        assert_eq!(client_ip(&h, None), "198.51.100.1");

        let addr: SocketAddr = "192.0.2.4:5555".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(addr)), "192.0.2.4");
    }

    #[test]
    fn unknown_without_any_source() {
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }
}
