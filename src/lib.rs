//! # Campusdesk API
//!
//! College management REST API built with Axum and PostgreSQL. Three roles
//! share one account table:
//!
//! | Role | Signs up | Can |
//! |------|----------|-----|
//! | Admin | CLI only | approve faculty and courses, manage fees, timetable, departments |
//! | Faculty | self-registers, waits for approval | create courses and exams, mark attendance, upload material |
//! | Student | self-registers, active at once | enroll, sit exams, pay fees, request leave |
//!
//! ## Layout
//!
//! ```text
//! src/
//! ├── bin/cli.rs     # campusdesk-cli (create-admin, seed, purge-expired)
//! ├── cli/           # CLI command implementations
//! ├── middleware/    # AuthUser extraction and role gates
//! ├── modules/       # one directory per feature area
//! ├── utils/         # email, payment gateway, reset tokens, expiry sweep
//! ├── docs.rs        # OpenAPI document
//! ├── logging.rs     # tracing subscriber and request logging
//! ├── metrics.rs     # Prometheus recorder and business counters
//! ├── router.rs      # /api routes, /health, /files, docs UIs
//! └── state.rs       # AppState
//! ```
//!
//! Each feature module has `controller.rs` (handlers), `service.rs`
//! (queries and rules), `model.rs` (re-exported from `campusdesk-models`)
//! and `router.rs`.
//!
//! ## Sessions
//!
//! `POST /api/auth/login` returns an HS256 JWT and sets it as the HttpOnly
//! `token` cookie. Either the cookie or an `Authorization: Bearer` header is
//! accepted; the user row is re-read on every request, so deactivating an
//! account takes effect immediately.
//!
//! ## Side effects
//!
//! Notifications and activity log entries are written in the same
//! transaction as the change that caused them.

pub mod cli;
pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

pub use campusdesk_auth;
pub use campusdesk_config;
pub use campusdesk_core;
pub use campusdesk_db;
pub use campusdesk_models;
