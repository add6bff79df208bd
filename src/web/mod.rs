//! Browser-facing HTTP service.
//!
//! ## Module Map
//!
//! ```text
//! ┌─────────┐  GET /                        ┌───────────────────────────────────┐
//! │ Browser │ ────────────────────────────> │ server.rs  (Router, ServerConfig) │
//! │         │  GET /generate_agentic_stream │   └─ api.rs  (handlers, AppState) │
//! │         │ <──── text/event-stream ───── │        │                          │
//! └─────────┘                               │        │ Orchestrator::run()      │
//!                                           │        v                          │
//!                                           │ pipeline  (one task per request)  │
//!                                           └───────────────────────────────────┘
//! ```
//!
//! | Module     | Responsibility                                         |
//! |------------|--------------------------------------------------------|
//! | `server`   | Router assembly, static assets, bind and shutdown      |
//! | `api`      | Route handlers and the SSE bridge                      |
//! | `embedded` | Page template and assets compiled in with `rust-embed` |
//!
//! Each request to `/generate_agentic_stream` spawns its own generation
//! run; the response body is the receiving end of that run's event channel.
//! Closing the connection drops the receiver, which ends the run at its
//! next emit.

pub mod api;
pub mod embedded;
pub mod server;

pub use api::{AppState, SharedState};
pub use server::{ServerConfig, build_router, start_server};
