// `peer_sync` hosts the relay; `peer_sync peer` joins a session as a headless peer.

#[tokio::main]
async fn main() -> std::io::Result<()> {
    match std::env::args().nth(1).as_deref() {
        Some("peer") => peer_sync::run_peer().await,
        Some("relay") | None => peer_sync::run_with_config().await,
        Some(other) => Err(std::io::Error::other(format!(
            "unknown mode `{other}`; expected `relay` or `peer`"
        ))),
    }
}
