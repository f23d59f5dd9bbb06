/// Middleware modules for the API server
///
/// Authentication middleware lives in `taskdesk_shared::auth::middleware`;
/// this module holds the middleware that is purely an HTTP-surface
/// concern.

pub mod security;
