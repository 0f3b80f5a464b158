//! Test harness for the `eks/cluster` infrastructure component.
//!
//! The crate deploys the component through the external atmos CLI,
//! reads its outputs, verifies live cluster state through the AWS and
//! Kubernetes APIs, and guarantees teardown whatever the test outcome.
//! The actual component tests live under `tests/component`; everything
//! here is the plumbing they share.

pub mod checks;
pub mod config;
pub mod deployment;
pub mod eks;
pub mod engine;
pub mod error;
pub mod kubeapi;
pub mod outputs;
pub mod suite;

pub use checks::Checks;
pub use config::SuiteConfig;
pub use deployment::Deployment;
pub use engine::{AtmosEngine, Engine, EngineCall, StaticEngine, Vars};
pub use error::{Error, Result};
pub use outputs::OutputSet;
pub use suite::{DependencyHandle, Suite};
