use readlog_core::Previewer;

/// Shared application state passed to all handlers.
///
/// The previewer is built once at startup; clones share its HTTP client.
#[derive(Clone)]
pub struct AppState {
    pub previewer: Previewer,
}
