//! Command-line flags layered over the configuration file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::CollectorConfig;
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "phase-collector")]
#[command(about = "Exports the time cluster resources spend in each status phase", long_about = None)]
pub struct CliArgs {
    /// TOML configuration file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// API group of the resource to watch
    #[arg(long)]
    pub group: Option<String>,

    /// API version of the resource to watch
    #[arg(long)]
    pub version: Option<String>,

    /// API resource to watch
    #[arg(long)]
    pub resource: Option<String>,

    /// API kind to watch
    #[arg(long)]
    pub kind: Option<String>,

    /// Namespace to watch (all namespaces when unset)
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Selector (label query) to filter on, supports '=', '==', and '!='.(e.g. -l key1=value1,key2=value2)
    #[arg(short = 'l', long = "selector")]
    pub label_selector: Option<String>,

    /// Selector (field query) to filter on, supports '=', '==', and '!='.(e.g. --field-selector key1=value1,key2=value2)
    #[arg(long)]
    pub field_selector: Option<String>,

    /// Final phase a resource will enter. Causes the timers for the resource to reset.
    #[arg(long)]
    pub final_phase: Option<String>,

    /// Port prometheus metrics get exposed at
    #[arg(long)]
    pub metrics_port: Option<u16>,

    /// Address of the cluster API server
    #[arg(long)]
    pub server: Option<String>,

    /// Bearer token for authentication to the API server
    #[arg(long)]
    pub token: Option<String>,

    /// Path to a cert file for the certificate authority
    #[arg(long = "certificate-authority")]
    pub ca_file: Option<PathBuf>,

    /// Skip verification of the server's certificate
    #[arg(long)]
    pub insecure_skip_tls_verify: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Read the config file (if any), apply flag overrides and validate.
    pub fn into_config(self) -> Result<CollectorConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => CollectorConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Overwrite `config` with every flag that was given.
    pub fn apply(self, config: &mut CollectorConfig) {
        let watch = &mut config.watch;
        override_with(&mut watch.group, self.group);
        override_with(&mut watch.version, self.version);
        override_with(&mut watch.resource, self.resource);
        override_with(&mut watch.kind, self.kind);
        override_with(&mut watch.namespace, self.namespace);
        override_with(&mut watch.label_selector, self.label_selector);
        override_with(&mut watch.field_selector, self.field_selector);
        override_with(&mut config.final_phase, self.final_phase);
        override_with(&mut config.observability.log_level, self.log_level);

        if let Some(port) = self.metrics_port {
            config.observability.metrics_address = format!("0.0.0.0:{}", port);
        }

        let cluster = &mut config.cluster;
        if self.server.is_some() {
            cluster.server = self.server;
        }
        if self.token.is_some() {
            cluster.token = self.token;
        }
        if self.ca_file.is_some() {
            cluster.ca_file = self.ca_file;
        }
        cluster.insecure_skip_tls_verify |= self.insecure_skip_tls_verify;
    }
}

fn override_with(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value;
    }
}
