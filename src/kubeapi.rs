//! Kubernetes API access for a deployed EKS cluster.
//!
//! Credentials are derived, not read from disk: a SigV4 query-presigned
//! STS GetCallerIdentity request carrying the `x-k8s-aws-id` header is
//! base64url-encoded into the standard `k8s-aws-v1.` bearer token, then
//! an in-memory kubeconfig (endpoint + CA data + token) is handed to
//! `Config::from_custom_kubeconfig`.  The resulting client is short-lived
//! by construction; the presigned URL expires after a minute.

use std::time::{Duration, SystemTime};

use aws_config::SdkConfig;
use aws_credential_types::provider::ProvideCredentials;
use aws_sigv4::http_request::{
    sign, SignableBody, SignableRequest, SignatureLocation, SigningSettings,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, ResourceExt};
use serde_json::json;

use crate::eks::ClusterHandle;
use crate::error::{Error, Result};

const TOKEN_PREFIX: &str = "k8s-aws-v1.";
const PRESIGN_EXPIRY: Duration = Duration::from_secs(60);

/// Build the EKS authenticator bearer token for the cluster.
pub async fn bearer_token(config: &SdkConfig, region: &str, cluster_name: &str) -> Result<String> {
    let provider = config
        .credentials_provider()
        .ok_or_else(|| Error::aws("no AWS credentials provider configured"))?;
    let credentials = provider
        .provide_credentials()
        .await
        .map_err(|e| Error::aws(format!("resolving AWS credentials: {e}")))?;
    let identity = Identity::from(credentials);

    let mut settings = SigningSettings::default();
    settings.signature_location = SignatureLocation::QueryParams;
    settings.expires_in = Some(PRESIGN_EXPIRY);
    let params: aws_sigv4::http_request::SigningParams = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name("sts")
        .time(SystemTime::now())
        .settings(settings)
        .build()
        .map_err(|e| Error::aws(format!("building signing parameters: {e}")))?
        .into();

    let host = format!("sts.{region}.amazonaws.com");
    let url = format!("https://{host}/?Action=GetCallerIdentity&Version=2011-06-15");
    let headers = [("host", host.as_str()), ("x-k8s-aws-id", cluster_name)];
    let signable = SignableRequest::new(
        "GET",
        url.as_str(),
        headers.iter().copied(),
        SignableBody::Bytes(&[]),
    )
    .map_err(|e| Error::aws(format!("building token request: {e}")))?;
    let (instructions, _signature) = sign(signable, &params)
        .map_err(|e| Error::aws(format!("presigning token request: {e}")))?
        .into_parts();

    let mut request = http::Request::builder()
        .method("GET")
        .uri(url.as_str())
        .header("x-k8s-aws-id", cluster_name)
        .body(())
        .map_err(|e| Error::aws(format!("building token request: {e}")))?;
    instructions.apply_to_request_http1x(&mut request);

    Ok(format!(
        "{TOKEN_PREFIX}{}",
        URL_SAFE_NO_PAD.encode(request.uri().to_string())
    ))
}

/// Credentialed API client for the cluster behind the handle.
pub async fn client_for(
    handle: &ClusterHandle,
    config: &SdkConfig,
    region: &str,
) -> Result<Client> {
    let token = bearer_token(config, region, &handle.name).await?;
    let kubeconfig = kubeconfig_for(handle, &token)?;
    let client_config =
        Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
    Ok(Client::try_from(client_config)?)
}

/// List the cluster's namespaces and return their names.
pub async fn namespace_names(client: &Client) -> Result<Vec<String>> {
    let api: Api<Namespace> = Api::all(client.clone());
    let namespaces = api.list(&ListParams::default()).await?;
    Ok(namespaces.items.iter().map(|ns| ns.name_any()).collect())
}

fn kubeconfig_for(handle: &ClusterHandle, token: &str) -> Result<Kubeconfig> {
    let name = &handle.name;
    let kubeconfig = serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{
            "name": name,
            "cluster": {
                "server": handle.endpoint,
                "certificate-authority-data": handle.certificate_authority,
            },
        }],
        "users": [{
            "name": name,
            "user": { "token": token },
        }],
        "contexts": [{
            "name": name,
            "context": { "cluster": name, "user": name },
        }],
        "current-context": name,
    }))?;
    Ok(kubeconfig)
}
