use crate::use_cases::RelayRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Sessions hosted by this relay.
    pub relay_registry: Arc<RelayRegistry>,
    // Session used when a peer does not name one.
    pub default_session_id: Arc<str>,
}
