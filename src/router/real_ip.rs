use {
    crate::ClientIp,
    axum::{
        extract::{ConnectInfo, Request, State},
        middleware::Next,
        response::Response,
    },
    http::{HeaderMap, HeaderName},
    std::{
        net::{IpAddr, SocketAddr},
        sync::Arc,
    },
};

/// The first trusted header, in the order given, that carries a valid
/// address. For list-valued headers such as `X-Forwarded-For` the first
/// (client-most) entry wins.
pub fn client_ip_from_headers(headers: &HeaderMap, trusted: &[HeaderName]) -> Option<IpAddr> {
    trusted.iter().find_map(|name| {
        let value = headers.get(name)?.to_str().ok()?;
        value.split(',').next()?.trim().parse().ok()
    })
}

/// Attaches [`ClientIp`], falling back to the peer address of the socket.
pub(crate) async fn resolve_client_ip(
    State(trusted): State<Arc<[HeaderName]>>,
    mut request: Request,
    next: Next,
) -> Response {
    let ip = client_ip_from_headers(request.headers(), &trusted).or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    });
    if let Some(ip) = ip {
        request.extensions_mut().insert(ClientIp(ip));
    }
    next.run(request).await
}
