//! The basic scenario: deploy the cluster component on top of its vpc
//! dependency, check every contract output, cross-check the live cluster
//! against those outputs, list namespaces through the derived client,
//! and confirm the stack has no drift.  Every failed check is reported;
//! teardown runs regardless.

use eks_cluster_suite::{eks, kubeapi, Checks, Vars};

use super::common::{
    self, COMPONENT, DEPENDENCY, EXPECTED_ADDONS, EXPECTED_CLUSTER_VERSION, ID_PREFIX,
};

#[tokio::test]
#[ignore = "requires AWS credentials and an atmos stacks checkout"]
async fn basic_cluster_matches_stack_contract() {
    common::init_tracing();
    let mut suite = common::suite();
    let region = suite.config().region.clone();

    suite
        .deploy_dependency(DEPENDENCY)
        .expect("vpc dependency must deploy");
    let cluster = suite
        .deploy(COMPONENT, Vars::new())
        .expect("eks/cluster must deploy");

    let aws = eks::aws_config(&region).await;
    let account = eks::account_id(&aws).await.expect("caller account id");

    let mut checks = Checks::new("eks/cluster basic scenario");

    // ── Cluster identity outputs ────────────────────────────────────────

    let id = checks.value("eks_cluster_id", cluster.output("eks_cluster_id"));
    if let Some(id) = &id {
        checks.starts_with("eks_cluster_id", id, ID_PREFIX);
    }

    let arn = checks.value("eks_cluster_arn", cluster.output("eks_cluster_arn"));
    if let (Some(id), Some(arn)) = (&id, &arn) {
        checks.eq(
            "eks_cluster_arn",
            arn.clone(),
            format!("arn:aws:eks:{region}:{account}:cluster/{id}"),
        );
    }

    let endpoint = checks.value("eks_cluster_endpoint", cluster.output("eks_cluster_endpoint"));
    if let Some(endpoint) = &endpoint {
        checks.ends_with(
            "eks_cluster_endpoint",
            endpoint,
            &format!("{region}.eks.amazonaws.com"),
        );
    }

    let oidc_issuer = checks.value(
        "eks_cluster_identity_oidc_issuer",
        cluster.output("eks_cluster_identity_oidc_issuer"),
    );
    if let Some(oidc_issuer) = &oidc_issuer {
        checks.starts_with(
            "eks_cluster_identity_oidc_issuer",
            oidc_issuer,
            &format!("https://oidc.eks.{region}.amazonaws.com/id"),
        );
    }

    if let Some(ca_data) = checks.value(
        "eks_cluster_certificate_authority_data",
        cluster.output("eks_cluster_certificate_authority_data"),
    ) {
        checks.non_empty("eks_cluster_certificate_authority_data", &ca_data);
    }

    if let Some(security_group) = checks.value(
        "eks_cluster_managed_security_group_id",
        cluster.output("eks_cluster_managed_security_group_id"),
    ) {
        checks.starts_with("eks_cluster_managed_security_group_id", &security_group, "sg-");
    }

    let version = checks.value("eks_cluster_version", cluster.output("eks_cluster_version"));
    if let Some(version) = &version {
        checks.eq("eks_cluster_version", version.as_str(), EXPECTED_CLUSTER_VERSION);
    }

    // ── Node groups ─────────────────────────────────────────────────────

    let _ = common::list_of_len(&mut checks, &cluster, "eks_node_group_arns", 2);
    let _ = common::list_of_len(&mut checks, &cluster, "eks_managed_node_workers_role_arns", 2);
    let _ = common::list_of_len(&mut checks, &cluster, "eks_node_group_ids", 2);
    let _ = common::list_of_len(&mut checks, &cluster, "eks_node_group_role_names", 2);
    let _ = common::list_of_len(&mut checks, &cluster, "eks_auth_worker_roles", 1);

    if let Some(count) = checks.value("eks_node_group_count", cluster.output("eks_node_group_count"))
    {
        checks.eq("eks_node_group_count", count.as_str(), "2");
    }

    if let Some(statuses) =
        common::list_of_len(&mut checks, &cluster, "eks_node_group_statuses", 2)
    {
        for (i, status) in statuses.iter().enumerate() {
            checks.eq(
                &format!("eks_node_group_statuses[{i}]"),
                status.as_str(),
                "ACTIVE",
            );
        }
    }

    // ── Karpenter and Fargate roles ─────────────────────────────────────

    let karpenter_role = checks.value(
        "karpenter_iam_role_name",
        cluster.output("karpenter_iam_role_name"),
    );
    if let Some(role) = &karpenter_role {
        checks.starts_with("karpenter_iam_role_name", role, ID_PREFIX);
    }
    let karpenter_arn = checks.value(
        "karpenter_iam_role_arn",
        cluster.output("karpenter_iam_role_arn"),
    );
    if let (Some(role), Some(arn)) = (&karpenter_role, &karpenter_arn) {
        checks.starts_with(
            "karpenter_iam_role_arn",
            arn,
            &format!("arn:aws:iam::{account}:role/{role}"),
        );
    }

    let fargate_role_names =
        common::list_of_len(&mut checks, &cluster, "fargate_profile_role_names", 1);
    if let Some(name) = fargate_role_names.as_ref().and_then(|names| names.first()) {
        checks.starts_with("fargate_profile_role_names[0]", name, ID_PREFIX);
    }
    let fargate_role_arns =
        common::list_of_len(&mut checks, &cluster, "fargate_profile_role_arns", 1);
    if let (Some(name), Some(arn)) = (
        fargate_role_names.as_ref().and_then(|names| names.first()),
        fargate_role_arns.as_ref().and_then(|arns| arns.first()),
    ) {
        checks.starts_with(
            "fargate_profile_role_arns[0]",
            arn,
            &format!("arn:aws:iam::{account}:role/{name}"),
        );
    }

    if let Some(profiles) = checks.value(
        "fargate_profiles",
        cluster.outputs().object_map("fargate_profiles"),
    ) {
        if profiles.is_empty() {
            checks.fail("fargate_profiles: unexpectedly empty");
        }
    }

    // ── Networking ──────────────────────────────────────────────────────

    if let Some(cidr) = checks.value("vpc_cidr", cluster.output("vpc_cidr")) {
        checks.eq("vpc_cidr", cidr.as_str(), "172.16.0.0/16");
    }
    let _ = common::list_of_len(&mut checks, &cluster, "availability_zones", 2);

    // ── Add-ons ─────────────────────────────────────────────────────────

    if let Some(addons) = checks.value(
        "eks_addons_versions",
        cluster.output_map("eks_addons_versions"),
    ) {
        checks.eq("eks_addons_versions size", addons.len(), EXPECTED_ADDONS.len());
        for (addon, expected) in EXPECTED_ADDONS {
            match addons.get(*addon) {
                Some(found) => checks.eq(
                    &format!("eks_addons_versions[{addon}]"),
                    found.as_str(),
                    *expected,
                ),
                None => checks.fail(format!("eks_addons_versions: missing entry for {addon}")),
            }
        }
    }

    // ── Live cluster state ──────────────────────────────────────────────

    if let Some(id) = &id {
        match eks::describe_cluster(&aws, id).await {
            Ok(handle) => {
                checks.eq("cluster.name", handle.name.clone(), id.clone());
                if let Some(arn) = &arn {
                    checks.eq("cluster.arn", handle.arn.clone(), arn.clone());
                }
                if let Some(endpoint) = &endpoint {
                    checks.eq("cluster.endpoint", handle.endpoint.clone(), endpoint.clone());
                }
                if let Some(oidc_issuer) = &oidc_issuer {
                    checks.eq(
                        "cluster.identity.oidc.issuer",
                        handle.oidc_issuer.clone(),
                        oidc_issuer.clone(),
                    );
                }
                checks.eq("cluster.status", handle.status.as_str(), "ACTIVE");
                checks.eq(
                    "cluster.version",
                    handle.version.as_str(),
                    EXPECTED_CLUSTER_VERSION,
                );

                match kubeapi::client_for(&handle, &aws, &region).await {
                    Ok(client) => match kubeapi::namespace_names(&client).await {
                        Ok(namespaces) => checks.has_len("namespaces", &namespaces, 4),
                        Err(e) => checks.fail(format!("listing namespaces: {e}")),
                    },
                    Err(e) => checks.fail(format!("building cluster API client: {e}")),
                }
            }
            Err(e) => checks.fail(format!("describing cluster {id}: {e}")),
        }
    }

    // ── Drift ───────────────────────────────────────────────────────────

    if let Err(e) = suite.verify_no_drift(COMPONENT, &Vars::new()) {
        checks.fail(e.to_string());
    }

    // Tear down first so a failing run still confirms cleanup, then
    // report every recorded failure at once.
    let verdict = checks.finish();
    cluster.destroy().expect("destroy eks/cluster");
    suite.teardown().expect("destroy dependencies");
    if let Err(e) = verdict {
        panic!("{e}");
    }
}
