//! AWS control-plane lookups: caller identity and the deployed cluster.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_eks::error::DisplayErrorContext;

use crate::error::{Error, Result};

/// Remote descriptor of a deployed EKS cluster, fetched independently of
/// the component outputs so the two can be cross-checked field by field.
#[derive(Clone, Debug)]
pub struct ClusterHandle {
    pub name: String,
    pub arn: String,
    pub endpoint: String,
    pub oidc_issuer: String,
    /// Base64-encoded PEM bundle, exactly as the API returns it (and as a
    /// kubeconfig expects it).
    pub certificate_authority: String,
    pub status: String,
    pub version: String,
}

/// Load the default credential chain pinned to the given region.
pub async fn aws_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// Account id of the active credentials, via STS GetCallerIdentity.
pub async fn account_id(config: &SdkConfig) -> Result<String> {
    let sts = aws_sdk_sts::Client::new(config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| Error::aws(format!("GetCallerIdentity: {}", DisplayErrorContext(&e))))?;
    identity
        .account()
        .map(str::to_string)
        .ok_or_else(|| Error::aws("GetCallerIdentity returned no account id"))
}

/// Fetch the cluster descriptor.  A cluster the API does not know about
/// is reported as [`Error::NotFound`]; any other API failure is
/// [`Error::Aws`].
pub async fn describe_cluster(config: &SdkConfig, name: &str) -> Result<ClusterHandle> {
    let eks = aws_sdk_eks::Client::new(config);
    let response = eks.describe_cluster().name(name).send().await.map_err(|e| {
        if e.as_service_error()
            .is_some_and(|se| se.is_resource_not_found_exception())
        {
            Error::NotFound(format!("EKS cluster {name}"))
        } else {
            Error::aws(format!(
                "DescribeCluster {name}: {}",
                DisplayErrorContext(&e)
            ))
        }
    })?;

    let cluster = response
        .cluster()
        .ok_or_else(|| Error::NotFound(format!("EKS cluster {name}")))?;
    let missing = |field: &str| Error::aws(format!("cluster {name}: DescribeCluster omitted {field}"));

    Ok(ClusterHandle {
        name: cluster.name().ok_or_else(|| missing("name"))?.to_string(),
        arn: cluster.arn().ok_or_else(|| missing("arn"))?.to_string(),
        endpoint: cluster
            .endpoint()
            .ok_or_else(|| missing("endpoint"))?
            .to_string(),
        oidc_issuer: cluster
            .identity()
            .and_then(|id| id.oidc())
            .and_then(|oidc| oidc.issuer())
            .ok_or_else(|| missing("identity.oidc.issuer"))?
            .to_string(),
        certificate_authority: cluster
            .certificate_authority()
            .and_then(|ca| ca.data())
            .ok_or_else(|| missing("certificateAuthority.data"))?
            .to_string(),
        status: cluster
            .status()
            .ok_or_else(|| missing("status"))?
            .as_str()
            .to_string(),
        version: cluster
            .version()
            .ok_or_else(|| missing("version"))?
            .to_string(),
    })
}
