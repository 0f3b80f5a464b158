//! Deploy engine abstraction.
//!
//! The component under test is provisioned by an external CLI (atmos
//! driving terraform).  The trait keeps that collaborator behind a seam
//! so the harness tests can substitute an instrumented in-memory double.
//! Calls are synchronous and blocking; the workflow runs strictly in
//! order and never retries.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Mutex;
use std::time::Instant;

use serde_json::Value;
use tracing::info;

use crate::config::SuiteConfig;
use crate::error::{Error, Result};
use crate::outputs::OutputSet;

/// Input variables passed to a component deploy.
pub type Vars = BTreeMap<String, Value>;

pub trait Engine: Send + Sync {
    /// Provision the component into the stack.
    fn deploy(&self, component: &str, stack: &str, vars: &Vars) -> Result<()>;

    /// Tear the component down.
    fn destroy(&self, component: &str, stack: &str, vars: &Vars) -> Result<()>;

    /// Fetch the component's outputs.
    fn outputs(&self, component: &str, stack: &str) -> Result<OutputSet>;

    /// Re-plan the component; true when the plan reports pending changes.
    fn has_drift(&self, component: &str, stack: &str, vars: &Vars) -> Result<bool>;
}

// ── AtmosEngine ─────────────────────────────────────────────────────────────

/// Production engine shelling out to the atmos CLI from the stacks
/// checkout root.
pub struct AtmosEngine {
    binary: PathBuf,
    base_dir: PathBuf,
}

impl AtmosEngine {
    pub fn new(config: &SuiteConfig) -> Self {
        Self {
            binary: config.atmos_bin.clone(),
            base_dir: config.base_dir.clone(),
        }
    }

    /// Run the CLI and return (exit code, stdout).  Spawn failures and
    /// signal deaths are engine errors; callers interpret the exit code.
    fn run(&self, args: &[String]) -> Result<(i32, String)> {
        let command_line = format!("{} {}", self.binary.display(), args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.base_dir)
            .output()
            .map_err(|e| Error::engine(format!("failed to run `{command_line}`: {e}")))?;
        let code = output.status.code().ok_or_else(|| {
            Error::engine(format!("`{command_line}` was terminated by a signal"))
        })?;
        Ok((code, String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    /// Run the CLI and require exit code 0, folding stderr into the error.
    fn run_ok(&self, args: &[String]) -> Result<String> {
        let command_line = format!("{} {}", self.binary.display(), args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.base_dir)
            .output()
            .map_err(|e| Error::engine(format!("failed to run `{command_line}`: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::engine(format!(
                "`{command_line}` exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn terraform_args(subcommand: &str, component: &str, stack: &str, vars: &Vars) -> Vec<String> {
        let mut args = vec![
            "terraform".to_string(),
            subcommand.to_string(),
            component.to_string(),
            "-s".to_string(),
            stack.to_string(),
        ];
        for (key, value) in vars {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            args.push("-var".to_string());
            args.push(format!("{key}={rendered}"));
        }
        args
    }
}

impl Engine for AtmosEngine {
    fn deploy(&self, component: &str, stack: &str, vars: &Vars) -> Result<()> {
        let started = Instant::now();
        info!(component, stack, "deploying component");
        self.run_ok(&Self::terraform_args("deploy", component, stack, vars))?;
        info!(component, stack, elapsed = ?started.elapsed(), "deploy complete");
        Ok(())
    }

    fn destroy(&self, component: &str, stack: &str, vars: &Vars) -> Result<()> {
        let started = Instant::now();
        info!(component, stack, "destroying component");
        self.run_ok(&Self::terraform_args("destroy", component, stack, vars))?;
        info!(component, stack, elapsed = ?started.elapsed(), "destroy complete");
        Ok(())
    }

    fn outputs(&self, component: &str, stack: &str) -> Result<OutputSet> {
        let mut args = Self::terraform_args("output", component, stack, &Vars::new());
        args.push("--".to_string());
        args.push("-json".to_string());
        let stdout = self.run_ok(&args)?;
        let value: Value = serde_json::from_str(&stdout)?;
        OutputSet::from_terraform_json(value)
    }

    fn has_drift(&self, component: &str, stack: &str, vars: &Vars) -> Result<bool> {
        let mut args = Self::terraform_args("plan", component, stack, vars);
        args.push("--".to_string());
        args.push("-detailed-exitcode".to_string());
        args.push("-input=false".to_string());
        // terraform -detailed-exitcode: 0 = clean, 2 = pending changes.
        match self.run(&args)? {
            (0, _) => Ok(false),
            (2, _) => Ok(true),
            (code, _) => Err(Error::engine(format!(
                "plan for {component} in {stack} exited with {code}"
            ))),
        }
    }
}

// ── StaticEngine ────────────────────────────────────────────────────────────

/// One recorded engine invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineCall {
    pub op: &'static str,
    pub component: String,
    pub stack: String,
    pub vars: Vars,
}

/// In-memory engine for harness tests: serves canned outputs and records
/// every call so tests can assert on the deploy/destroy sequence.
#[derive(Default)]
pub struct StaticEngine {
    outputs: OutputSet,
    drift: bool,
    fail_deploy: bool,
    calls: Mutex<Vec<EngineCall>>,
}

impl StaticEngine {
    /// Engine whose deployed component exposes the given outputs
    /// (a JSON object of raw values).
    pub fn new(outputs: Value) -> Self {
        let values = match outputs {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self {
            outputs: OutputSet::new(values),
            ..Default::default()
        }
    }

    /// Engine whose deployed component exposes no outputs at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_drift(mut self, drift: bool) -> Self {
        self.drift = drift;
        self
    }

    /// Make every deploy fail, for exercising the cleanup-on-failure path.
    pub fn failing_deploy(mut self) -> Self {
        self.fail_deploy = true;
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().expect("engine call log poisoned").clone()
    }

    /// How many times `op` was invoked for `component`.
    pub fn count(&self, op: &str, component: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.op == op && c.component == component)
            .count()
    }

    fn record(&self, op: &'static str, component: &str, stack: &str, vars: &Vars) {
        self.calls
            .lock()
            .expect("engine call log poisoned")
            .push(EngineCall {
                op,
                component: component.to_string(),
                stack: stack.to_string(),
                vars: vars.clone(),
            });
    }
}

impl Engine for StaticEngine {
    fn deploy(&self, component: &str, stack: &str, vars: &Vars) -> Result<()> {
        self.record("deploy", component, stack, vars);
        if self.fail_deploy {
            return Err(Error::engine(format!("deploy of {component} failed")));
        }
        Ok(())
    }

    fn destroy(&self, component: &str, stack: &str, vars: &Vars) -> Result<()> {
        self.record("destroy", component, stack, vars);
        Ok(())
    }

    fn outputs(&self, component: &str, stack: &str) -> Result<OutputSet> {
        self.record("outputs", component, stack, &Vars::new());
        Ok(self.outputs.clone())
    }

    fn has_drift(&self, component: &str, stack: &str, vars: &Vars) -> Result<bool> {
        self.record("plan", component, stack, vars);
        Ok(self.drift)
    }
}
