//! # Strata Engine
//!
//! The application context. [`Engine::bootstrap`] builds every component
//! once from a [`config::Config`]; callers hold `&Engine` and reach the
//! components through its fields.
//!
//! ```rust,no_run
//! use config::Config;
//! use engine::Engine;
//! use st_core::GenerationOptions;
//!
//! # async fn run() -> Result<(), errors::EngineError> {
//! let engine = Engine::bootstrap(&Config::default()).await?;
//! let outcome = engine
//!     .generate("parse a csv row", "python", None, GenerationOptions::new())
//!     .await?;
//! println!("{} via {}", outcome.code, outcome.strategy_id);
//! # Ok(())
//! # }
//! ```

mod app;
mod pending;

pub use app::{Engine, GenerationOutcome};
