use anyhow::Context as _;
use std::net::{SocketAddr, TcpListener};

/// Pick an unused TCP port on localhost.
///
/// Note: this does not reserve the port; it's still possible for another process to bind it
/// before you do. Tests that need "nothing is listening here" rely on that being rare.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails or if the bound socket's
/// local address cannot be read.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// Serve `router` on an ephemeral localhost port from a background task.
///
/// The server lives until the runtime shuts down, which for `#[tokio::test]` is the end of the
/// test.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn serve(router: axum::Router) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind fake gateway")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}
