//! HTTP middleware and extractors.
//!
//! # Layer order (outermost first, see `build_router`)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Authentication is an extractor ([`RequireUser`]) rather than a layer so
//! the health endpoints stay public.

pub mod auth;
pub mod flash;
pub mod format;
pub mod session;

pub use auth::{AuthRejection, RequireUser};
pub use flash::{Flash, FlashKind, set_flash, take_flash};
pub use format::{Payload, ResponseFormat};
pub use session::create_session_layer;
