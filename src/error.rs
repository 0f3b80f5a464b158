use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("AWS API error: {0}")]
    Aws(String),

    #[error("deploy engine error: {0}")]
    Engine(String),

    #[error("output error: {0}")]
    Output(String),

    #[error("drift detected: {0}")]
    Drift(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Checks(String),
}

/// Short alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn aws(msg: impl Into<String>) -> Self {
        Self::Aws(msg.into())
    }
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }
    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
