//! The disabled scenario: a component deployed with its disable flag set
//! must create nothing and expose nothing.

use super::common::{self, DISABLED_COMPONENT};

#[tokio::test]
#[ignore = "requires AWS credentials and an atmos stacks checkout"]
async fn disabled_component_produces_no_outputs() {
    common::init_tracing();
    let suite = common::suite();
    suite
        .verify_disabled(DISABLED_COMPONENT)
        .expect("disabled eks/cluster must create nothing");
}
