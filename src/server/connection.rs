// Connection handling module
// Accepts a single TCP connection and serves it with the request router

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tokio::sync::Notify;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing `max_connections`.
///
/// The counter is incremented before the limit check so concurrent accepts
/// cannot both slip under the limit.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    let state = Arc::clone(state);
    let conn_counter = Arc::clone(conn_counter);
    tokio::spawn(async move {
        serve_connection(stream, peer_addr, state).await;
        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Serve one connection until the client closes it or it goes idle.
///
/// `read_timeout` bounds how long a client may take to send request headers.
/// `keep_alive_timeout` closes a connection that has seen no new request for
/// that many seconds; a response still being written is finished first.
/// Nothing caps the total lifetime, so long downloads are never cut off.
async fn serve_connection(stream: TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    let performance = &state.config.performance;
    let keep_alive = Duration::from_secs(performance.keep_alive_timeout);
    let header_timeout =
        (performance.read_timeout > 0).then(|| Duration::from_secs(performance.read_timeout));

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(header_timeout)
        .keep_alive(!keep_alive.is_zero());

    let activity = Arc::new(Notify::new());
    let service_activity = Arc::clone(&activity);
    let service_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        TokioIo::new(stream),
        service_fn(move |req| {
            service_activity.notify_one();
            handler::handle_request(req, Arc::clone(&service_state), Some(peer_addr))
        }),
    );
    tokio::pin!(conn);

    let mut closing = keep_alive.is_zero();
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(err) = result {
                    logger::log_connection_error(&err);
                }
                break;
            }

            // A new request restarts the idle timer
            () = activity.notified() => {}

            () = tokio::time::sleep(keep_alive), if !closing => {
                logger::log_debug(&format!(
                    "Connection from {peer_addr} idle for {}s, closing",
                    keep_alive.as_secs()
                ));
                conn.as_mut().graceful_shutdown();
                closing = true;
            }
        }
    }
}
