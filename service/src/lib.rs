//! Service wiring for GateLink.
//!
//! Assembles the verification core, the reputation checker, the outbound
//! sinks, and the HTTP layer into one runnable [`GateService`], driven by a
//! TOML-loadable [`ServiceConfig`] and a latched [`ShutdownController`]
//! flag shared by every background task.

pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod shutdown;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use logging::{init_logging, LogFormat};
pub use service::GateService;
pub use shutdown::ShutdownController;
