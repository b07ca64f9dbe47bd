//! # nexserver - Serveur web haut niveau basé sur Axum
//!
//! This crate hides the Axum plumbing the NexSon service needs: route
//! registration, OpenAPI/Swagger documentation, permissive CORS, request
//! tracing, logging initialisation and graceful shutdown on Ctrl+C.
//!
//! ## Architecture
//!
//! - [`server`] : the [`Server`] itself and its builder
//! - [`logs`] : tracing subscriber setup and the `/api/log_setup` endpoints
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use nexserver::ServerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("MyServer", "0.0.0.0", 8080).build();
//!
//!     server.add_route("/api/status", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogState, LoggingOptions, init_logging};
pub use server::{Server, ServerBuilder, ServerInfo};
