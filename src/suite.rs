//! Suite bootstrap and the component workflows built on top of it.
//!
//! A [`Suite`] owns the configuration, the deploy engine and every
//! dependency component it has deployed.  Dependencies are an explicit
//! pre-test setup phase: deployed at most once, exposed to tests as
//! immutable [`DependencyHandle`]s, and torn down in reverse order when
//! the suite is dropped or [`Suite::teardown`] is called.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde_json::json;
use tracing::{info, warn};

use crate::config::SuiteConfig;
use crate::deployment::Deployment;
use crate::engine::{AtmosEngine, Engine, Vars};
use crate::error::{Error, Result};
use crate::outputs::OutputSet;

/// Immutable view of a dependency component deployed by the suite.
#[derive(Clone, Debug)]
pub struct DependencyHandle {
    component: String,
    outputs: OutputSet,
}

impl DependencyHandle {
    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn outputs(&self) -> &OutputSet {
        &self.outputs
    }
}

pub struct Suite {
    config: SuiteConfig,
    engine: Arc<dyn Engine>,
    suffix: String,
    dependencies: Vec<Deployment>,
    handles: BTreeMap<String, DependencyHandle>,
}

impl Suite {
    /// Bootstrap with the production atmos engine.  Configuration
    /// problems abort the suite here, before anything is deployed.
    pub fn bootstrap(config: SuiteConfig) -> Result<Self> {
        let engine = Arc::new(AtmosEngine::new(&config));
        Self::with_engine(config, engine)
    }

    /// Bootstrap with a caller-supplied engine (harness tests pass the
    /// instrumented double here).
    pub fn with_engine(config: SuiteConfig, engine: Arc<dyn Engine>) -> Result<Self> {
        config.validate()?;
        let suffix = random_suffix();
        info!(
            stack = %config.stack,
            region = %config.region,
            component_dir = %config.component_dir.display(),
            %suffix,
            "suite bootstrapped"
        );
        Ok(Self {
            config,
            engine,
            suffix,
            dependencies: Vec::new(),
            handles: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Per-run instance attribute appended to every deploy, so parallel
    /// suite runs against the same stack do not collide on resource names.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Vars every deploy of this run carries.
    fn base_vars(&self) -> Vars {
        let mut vars = Vars::new();
        vars.insert("attributes".to_string(), json!([self.suffix]));
        vars
    }

    fn merged_vars(&self, vars: Vars) -> Vars {
        let mut merged = self.base_vars();
        merged.extend(vars);
        merged
    }

    /// Deploy a dependency component exactly once and return its handle.
    /// A second call for the same component returns the existing handle
    /// without touching the engine.
    pub fn deploy_dependency(&mut self, component: &str) -> Result<DependencyHandle> {
        if let Some(handle) = self.handles.get(component) {
            return Ok(handle.clone());
        }
        let deployment = Deployment::deploy(
            self.engine.clone(),
            component,
            &self.config.stack,
            self.base_vars(),
        )?;
        let handle = DependencyHandle {
            component: component.to_string(),
            outputs: deployment.outputs().clone(),
        };
        self.dependencies.push(deployment);
        self.handles.insert(component.to_string(), handle.clone());
        Ok(handle)
    }

    /// Deploy the component under test.  The returned guard destroys it
    /// on drop, whatever the test outcome.
    pub fn deploy(&self, component: &str, vars: Vars) -> Result<Deployment> {
        Deployment::deploy(
            self.engine.clone(),
            component,
            &self.config.stack,
            self.merged_vars(vars),
        )
    }

    /// Deploy the component with its disable flag set and require that
    /// it produced no outputs at all.  The instance is destroyed before
    /// this returns.
    pub fn verify_disabled(&self, component: &str) -> Result<()> {
        let mut vars = Vars::new();
        vars.insert("enabled".to_string(), json!(false));
        let deployment = self.deploy(component, vars)?;
        let outputs = deployment.outputs();
        if !outputs.is_empty() {
            return Err(Error::output(format!(
                "disabled component {component} still produced outputs: {}",
                outputs.keys().join(", ")
            )));
        }
        deployment.destroy()
    }

    /// Re-plan a deployed component and fail when the stack configuration
    /// no longer matches what is running.
    pub fn verify_no_drift(&self, component: &str, vars: &Vars) -> Result<()> {
        let merged = self.merged_vars(vars.clone());
        if self
            .engine
            .has_drift(component, &self.config.stack, &merged)?
        {
            return Err(Error::Drift(format!(
                "component {component} in stack {} has pending changes",
                self.config.stack
            )));
        }
        Ok(())
    }

    /// Destroy every dependency in reverse deployment order, surfacing
    /// the first engine error.  Dropping the suite does the same with
    /// errors logged instead.
    pub fn teardown(mut self) -> Result<()> {
        self.handles.clear();
        let mut first_err = None;
        while let Some(deployment) = self.dependencies.pop() {
            if let Err(e) = deployment.destroy() {
                warn!(error = %e, "dependency teardown failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("config", &self.config)
            .field("suffix", &self.suffix)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

impl Drop for Suite {
    fn drop(&mut self) {
        // Reverse deployment order; each Deployment's own drop guard
        // performs the destroy and logs failures.
        while self.dependencies.pop().is_some() {}
    }
}

/// Six lowercase alphanumeric characters, matching the instance
/// attribute style the deployed resource names embed.
fn random_suffix() -> String {
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}
