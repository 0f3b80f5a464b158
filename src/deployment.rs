//! A deployed component instance with guaranteed teardown.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::engine::{Engine, Vars};
use crate::error::Result;
use crate::outputs::OutputSet;

/// Handle to a deployed component instance.
///
/// Deploying returns this guard; dropping it destroys the instance, so
/// teardown runs on every exit path, including assertion panics.  A
/// destroy failure during drop is logged and never overrides the test
/// outcome that is already unwinding; call [`Deployment::destroy`] to
/// surface the error instead.
pub struct Deployment {
    engine: Arc<dyn Engine>,
    component: String,
    stack: String,
    vars: Vars,
    outputs: OutputSet,
    destroyed: bool,
}

impl Deployment {
    /// Deploy the component and snapshot its outputs.
    ///
    /// Teardown is owed from the moment the deploy is attempted: when the
    /// deploy (or the output fetch) fails, a best-effort destroy removes
    /// whatever partial resources exist before the error is returned.
    pub(crate) fn deploy(
        engine: Arc<dyn Engine>,
        component: &str,
        stack: &str,
        vars: Vars,
    ) -> Result<Self> {
        let deployed = engine
            .deploy(component, stack, &vars)
            .and_then(|()| engine.outputs(component, stack));
        let outputs = match deployed {
            Ok(outputs) => outputs,
            Err(e) => {
                if let Err(destroy_err) = engine.destroy(component, stack, &vars) {
                    warn!(component, stack, error = %destroy_err, "cleanup after failed deploy also failed");
                }
                return Err(e);
            }
        };
        Ok(Self {
            engine,
            component: component.to_string(),
            stack: stack.to_string(),
            vars,
            outputs,
            destroyed: false,
        })
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    pub fn outputs(&self) -> &OutputSet {
        &self.outputs
    }

    /// Named scalar output.
    pub fn output(&self, key: &str) -> Result<String> {
        self.outputs.string(key)
    }

    /// Named list-of-strings output.
    pub fn output_list(&self, key: &str) -> Result<Vec<String>> {
        self.outputs.string_list(key)
    }

    /// Named map-of-scalars output.
    pub fn output_map(&self, key: &str) -> Result<std::collections::BTreeMap<String, String>> {
        self.outputs.string_map(key)
    }

    /// Destroy now and surface the engine error, instead of waiting for
    /// the drop guard.
    pub fn destroy(mut self) -> Result<()> {
        self.destroyed = true;
        self.engine.destroy(&self.component, &self.stack, &self.vars)
    }
}

impl fmt::Debug for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployment")
            .field("component", &self.component)
            .field("stack", &self.stack)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl Drop for Deployment {
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }
        if let Err(e) = self.engine.destroy(&self.component, &self.stack, &self.vars) {
            warn!(component = %self.component, stack = %self.stack, error = %e, "destroy during cleanup failed");
        }
    }
}
