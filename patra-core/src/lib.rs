//! # patra-core — Model Cards for trained ML models
//!
//! A model card records where a model came from, how well it performs, how
//! fair it is across a sensitive feature, which features drive it, and what
//! it needs installed. This crate provides:
//!
//! - the entity graph ([`ModelCard`], [`AIModel`], [`Metric`], [`BiasAnalysis`],
//!   [`ExplainabilityAnalysis`]),
//! - the model structure [`sanitize`]r,
//! - the canonical JSON [`encode`]r shared by validate, save and submit,
//! - the bundled-schema [`SchemaValidator`],
//! - the [`RegistryClient`] that posts cards to a registry,
//! - collaborator traits in [`analyzers`] with Python-backed implementations.
//!
//! ```no_run
//! use patra_core::{AIModel, ModelCard};
//!
//! # async fn run() -> Result<(), patra_core::CardError> {
//! let mut model = AIModel {
//!     name: "iris-dnn".into(),
//!     framework: "tensorflow".into(),
//!     ..Default::default()
//! };
//! model.add_metric("f1", "0.91");
//!
//! let card = ModelCard {
//!     name: "IrisNet".into(),
//!     ai_model: Some(model),
//!     ..Default::default()
//! };
//! if card.validate()? {
//!     card.save(std::path::Path::new("iris_card.json"))?;
//!     let _reply = card.submit("http://localhost:5002/upload_mc").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzers;
pub mod card;
pub mod config;
pub mod encode;
pub mod error;
pub mod persistence;
pub mod registry;
pub mod runtime;
pub mod sanitize;
pub mod schema;

pub use card::{AIModel, BiasAnalysis, ExplainabilityAnalysis, Metric, ModelCard};
pub use config::{PatraConfig, load_config};
pub use error::CardError;
pub use registry::RegistryClient;
pub use runtime::PythonRuntime;
pub use sanitize::sanitize;
pub use schema::SchemaValidator;
