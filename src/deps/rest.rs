//! # API-server connection configuration and its loader.
//!
//! [`RestConfig`] is the connection handle injected into controllers; it is
//! a [`kube::Config`], so a controller turns it into a client with
//! `kube::Client::try_from((*config).clone())`.
//!
//! [`ConfigLoader`] resolves it once during lazy initialization;
//! [`KubeConfigLoader`] is the default loader.
//!
//! ## Resolution order (KubeConfigLoader)
//! ```text
//! with_kubeconfig(path)?          → that file
//! KUBECONFIG set?                 → every listed file, merged
//! KUBERNETES_SERVICE_HOST set?    → kube::Config::incluster()   (failure falls through)
//! $HOME/.kube/config exists?      → that file
//! otherwise                       → ConfigError::NotFound
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kube::config::{KubeConfigOptions, Kubeconfig};

use crate::error::ConfigError;

/// Connection settings for the API server.
pub type RestConfig = kube::Config;

const KUBECONFIG: &str = "KUBECONFIG";
const IN_CLUSTER_HOST: &str = "KUBERNETES_SERVICE_HOST";

/// Resolves the connection configuration.
///
/// Called exactly once per [`Manager`](crate::Manager), during lazy
/// initialization. May block on file reads.
pub trait ConfigLoader: Send + Sync + 'static {
    /// Resolves the configuration from the ambient environment.
    fn resolve(&self) -> Result<RestConfig, ConfigError>;
}

impl<F> ConfigLoader for F
where
    F: Fn() -> Result<RestConfig, ConfigError> + Send + Sync + 'static,
{
    fn resolve(&self) -> Result<RestConfig, ConfigError> {
        self()
    }
}

/// Shared loader handle.
pub type LoaderRef = Arc<dyn ConfigLoader>;

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Loader following the usual kubeconfig / in-cluster precedence.
///
/// ## Example
/// ```no_run
/// use ctrlvisor::{ConfigLoader, KubeConfigLoader};
///
/// let cfg = KubeConfigLoader::new().with_context("staging").resolve()?;
/// println!("{} in {}", cfg.cluster_url, cfg.default_namespace);
/// # Ok::<(), ctrlvisor::ConfigError>(())
/// ```
pub struct KubeConfigLoader {
    env: EnvLookup,
    kubeconfig: Option<PathBuf>,
    options: KubeConfigOptions,
}

impl KubeConfigLoader {
    /// Loader over the real process environment.
    pub fn new() -> Self {
        Self::with_env(|key| std::env::var(key).ok())
    }

    /// Loader over a custom variable lookup (`KUBECONFIG`, `HOME`, ...).
    pub fn with_env(env: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            env: Box::new(env),
            kubeconfig: None,
            options: KubeConfigOptions::default(),
        }
    }

    /// Reads this kubeconfig file and nothing else.
    pub fn with_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    /// Uses `context` instead of the kubeconfig's current context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.options.context = Some(context.into());
        self
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|v| !v.is_empty())
    }

    fn home_kubeconfig(&self) -> Option<PathBuf> {
        let home = self.var("HOME").or_else(|| self.var("USERPROFILE"))?;
        Some(Path::new(&home).join(".kube").join("config"))
    }

    fn load_kubeconfig(&self, kubeconfig: Kubeconfig) -> Result<RestConfig, ConfigError> {
        // Token and client-cert kubeconfigs resolve without touching a runtime.
        futures::executor::block_on(RestConfig::from_custom_kubeconfig(kubeconfig, &self.options))
            .map_err(|e| ConfigError::Kubeconfig {
                error: e.to_string(),
            })
    }

    fn load_paths(
        &self,
        paths: impl IntoIterator<Item = PathBuf>,
    ) -> Result<RestConfig, ConfigError> {
        let mut merged: Option<Kubeconfig> = None;
        for path in paths {
            let next = read_kubeconfig(&path)?;
            merged = Some(match merged {
                None => next,
                Some(acc) => acc.merge(next).map_err(|e| ConfigError::Kubeconfig {
                    error: e.to_string(),
                })?,
            });
        }
        let kubeconfig = merged.ok_or_else(|| ConfigError::Kubeconfig {
            error: format!("{KUBECONFIG} lists no files"),
        })?;
        self.load_kubeconfig(kubeconfig)
    }
}

impl Default for KubeConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for KubeConfigLoader {
    fn resolve(&self) -> Result<RestConfig, ConfigError> {
        if let Some(path) = &self.kubeconfig {
            return self.load_paths([path.clone()]);
        }

        if let Some(list) = self.var(KUBECONFIG) {
            let paths = std::env::split_paths(&list).filter(|p| !p.as_os_str().is_empty());
            return self.load_paths(paths);
        }

        let mut tried = Vec::new();
        if self.var(IN_CLUSTER_HOST).is_some() {
            match RestConfig::incluster() {
                Ok(cfg) => return Ok(cfg),
                Err(e) => tried.push(format!("in-cluster: {e}")),
            }
        } else {
            tried.push(format!("in-cluster: {IN_CLUSTER_HOST} is unset"));
        }

        match self.home_kubeconfig() {
            Some(path) if path.is_file() => self.load_paths([path]),
            Some(path) => {
                tried.push(format!("{} does not exist", path.display()));
                Err(ConfigError::NotFound {
                    error: tried.join("; "),
                })
            }
            None => {
                tried.push("no home directory".to_string());
                Err(ConfigError::NotFound {
                    error: tried.join("; "),
                })
            }
        }
    }
}

fn read_kubeconfig(path: &Path) -> Result<Kubeconfig, ConfigError> {
    Kubeconfig::read_from(path).map_err(|e| ConfigError::Kubeconfig {
        error: format!("{}: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn kubeconfig_yaml(server: &str, namespace: &str) -> String {
        format!(
            "apiVersion: v1
kind: Config
clusters:
- name: main
  cluster:
    server: {server}
- name: staging
  cluster:
    server: https://staging.example:6443
users:
- name: main
  user:
    token: abc
contexts:
- name: main
  context:
    cluster: main
    user: main
    namespace: {namespace}
- name: staging
  context:
    cluster: staging
    user: main
current-context: main
"
        )
    }

    /// Per-test directory under the system temp dir.
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ctrlvisor-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_kubeconfig(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn loader(vars: &[(&str, String)]) -> KubeConfigLoader {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        KubeConfigLoader::with_env(move |k| map.get(k).cloned())
    }

    #[test]
    fn test_nothing_set_is_not_found() {
        let err = loader(&[]).resolve().unwrap_err();
        assert_eq!(err.as_label(), "config_not_found");
    }

    #[test]
    fn test_explicit_kubeconfig_current_context() {
        let dir = scratch_dir("explicit");
        let path = write_kubeconfig(&dir, &kubeconfig_yaml("https://api.example:6443", "ops"));

        let cfg = loader(&[]).with_kubeconfig(&path).resolve().unwrap();
        assert_eq!(cfg.cluster_url.host(), Some("api.example"));
        assert_eq!(cfg.default_namespace, "ops");
    }

    #[test]
    fn test_context_override() {
        let dir = scratch_dir("context");
        let path = write_kubeconfig(&dir, &kubeconfig_yaml("https://api.example:6443", "ops"));

        let cfg = loader(&[])
            .with_kubeconfig(&path)
            .with_context("staging")
            .resolve()
            .unwrap();
        assert_eq!(cfg.cluster_url.host(), Some("staging.example"));
    }

    #[test]
    fn test_kubeconfig_env_wins_over_home() {
        let home = scratch_dir("env-home");
        std::fs::create_dir_all(home.join(".kube")).unwrap();
        write_kubeconfig(&home.join(".kube"), &kubeconfig_yaml("https://home.example", "default"));
        let env_dir = scratch_dir("env-file");
        let env_file = write_kubeconfig(&env_dir, &kubeconfig_yaml("https://env.example", "default"));

        let cfg = loader(&[
            ("HOME", home.display().to_string()),
            ("KUBECONFIG", env_file.display().to_string()),
        ])
        .resolve()
        .unwrap();
        assert_eq!(cfg.cluster_url.host(), Some("env.example"));
    }

    #[test]
    fn test_home_kubeconfig_fallback() {
        let home = scratch_dir("home");
        std::fs::create_dir_all(home.join(".kube")).unwrap();
        write_kubeconfig(&home.join(".kube"), &kubeconfig_yaml("https://home.example", "team"));

        let cfg = loader(&[("HOME", home.display().to_string())]).resolve().unwrap();
        assert_eq!(cfg.cluster_url.host(), Some("home.example"));
        assert_eq!(cfg.default_namespace, "team");
    }

    #[test]
    fn test_missing_explicit_kubeconfig_is_an_error() {
        let err = loader(&[])
            .with_kubeconfig("/nonexistent/ctrlvisor/config")
            .resolve()
            .unwrap_err();
        assert_eq!(err.as_label(), "config_kubeconfig");
    }

    #[test]
    fn test_malformed_kubeconfig_is_an_error() {
        let dir = scratch_dir("malformed");
        let path = write_kubeconfig(&dir, "clusters: [this is not: a kubeconfig");
        let err = loader(&[]).with_kubeconfig(&path).resolve().unwrap_err();
        assert!(matches!(err, ConfigError::Kubeconfig { .. }));
    }
}
