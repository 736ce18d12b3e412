use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct OperatorConfig {
    #[envconfig(from = "HTTP_PORT", default = "8081")]
    pub http_port: u16,

    /// ConfigMap holding the domain and image tags used for new workspaces.
    /// Env: AICW_SETTINGS_CONFIGMAP
    #[envconfig(
        from = "AICW_SETTINGS_CONFIGMAP",
        default = "aichat-workspace-operator-config"
    )]
    pub settings_configmap: String,

    #[envconfig(
        from = "AICW_SETTINGS_NAMESPACE",
        default = "aichat-workspace-operator-system"
    )]
    pub settings_namespace: String,

    /// DNS suffix used to reach the in-cluster model runtime.
    #[envconfig(from = "AICW_CLUSTER_DOMAIN", default = "cluster.local")]
    pub cluster_domain: String,

    #[envconfig(from = "AICW_MAX_CONCURRENT_RECONCILES", default = "8")]
    pub max_concurrent_reconciles: u16,

    #[envconfig(nested)]
    pub intervals: IntervalsConfig,

    #[envconfig(nested)]
    pub features: FeaturesConfig,
}

#[derive(Envconfig, Clone, Debug)]
pub struct IntervalsConfig {
    #[envconfig(from = "AICW_RECONCILE_SUCCESS_SECS", default = "30")]
    pub success_secs: u64,
    #[envconfig(from = "AICW_RECONCILE_ERROR_SECS", default = "10")]
    pub error_secs: u64,
    /// Poll interval while the model runtime is not ready yet.
    #[envconfig(from = "AICW_READINESS_POLL_SECS", default = "5")]
    pub readiness_secs: u64,
    /// Upper bound for a single model pull.
    /// Env: AICW_MODEL_PULL_TIMEOUT_SECS
    #[envconfig(from = "AICW_MODEL_PULL_TIMEOUT_SECS", default = "3600")]
    pub model_pull_timeout_secs: u64,
    #[envconfig(from = "AICW_OLLAMA_REQUEST_TIMEOUT_SECS", default = "30")]
    pub ollama_request_timeout_secs: u64,
}

impl Default for IntervalsConfig {
    fn default() -> Self {
        Self {
            success_secs: 30,
            error_secs: 10,
            readiness_secs: 5,
            model_pull_timeout_secs: 3600,
            ollama_request_timeout_secs: 30,
        }
    }
}

impl IntervalsConfig {
    pub fn success(&self) -> Duration {
        Duration::from_secs(self.success_secs)
    }

    pub fn error(&self) -> Duration {
        Duration::from_secs(self.error_secs)
    }

    pub fn readiness(&self) -> Duration {
        Duration::from_secs(self.readiness_secs)
    }

    pub fn model_pull_timeout(&self) -> Duration {
        Duration::from_secs(self.model_pull_timeout_secs)
    }

    pub fn ollama_request_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama_request_timeout_secs)
    }
}

#[derive(Envconfig, Clone, Debug, Default)]
pub struct FeaturesConfig {
    /// Create a KEDA HTTPScaledObject for the chat front-end.
    /// Env: AICW_FEATURES_SCALE_TO_ZERO
    #[envconfig(from = "AICW_FEATURES_SCALE_TO_ZERO", default = "false")]
    pub scale_to_zero: bool,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            http_port: 8081,
            settings_configmap: "aichat-workspace-operator-config".into(),
            settings_namespace: "aichat-workspace-operator-system".into(),
            cluster_domain: "cluster.local".into(),
            max_concurrent_reconciles: 8,
            intervals: IntervalsConfig::default(),
            features: FeaturesConfig::default(),
        }
    }
}
