//! # Dependency injection into controllers.
//!
//! Each function returns `true` when the controller accepted the dependency
//! and `false` when it does not advertise the capability.

use std::sync::Arc;

use crate::deps::{InformersRef, RestConfig};

use super::controller::Controller;

/// Injects `informers` if the controller wants them.
pub fn inject_informers(informers: &InformersRef, controller: &dyn Controller) -> bool {
    match controller.informers_sink() {
        Some(sink) => {
            sink.inject_informers(Arc::clone(informers));
            true
        }
        None => false,
    }
}

/// Injects `config` if the controller wants it.
pub fn inject_config(config: &Arc<RestConfig>, controller: &dyn Controller) -> bool {
    match controller.config_sink() {
        Some(sink) => {
            sink.inject_config(Arc::clone(config));
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::controller::{InjectConfig, InjectInformers};
    use crate::deps::{Scheme, SelfPopulatingInformers};
    use crate::error::ControllerError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    struct Plain;

    #[async_trait]
    impl Controller for Plain {
        fn name(&self) -> &str {
            "plain"
        }
        async fn start(&self, _stop: CancellationToken) -> Result<(), ControllerError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Wants {
        hosts: Mutex<Vec<String>>,
        informers: Mutex<usize>,
    }

    impl InjectConfig for Wants {
        fn inject_config(&self, config: Arc<RestConfig>) {
            self.hosts.lock().unwrap().push(config.cluster_url.host().unwrap_or_default().to_string());
        }
    }

    impl InjectInformers for Wants {
        fn inject_informers(&self, _informers: InformersRef) {
            *self.informers.lock().unwrap() += 1;
        }
    }

    #[async_trait]
    impl Controller for Wants {
        fn name(&self) -> &str {
            "wants"
        }
        async fn start(&self, _stop: CancellationToken) -> Result<(), ControllerError> {
            Ok(())
        }
        fn config_sink(&self) -> Option<&dyn InjectConfig> {
            Some(self)
        }
        fn informers_sink(&self) -> Option<&dyn InjectInformers> {
            Some(self)
        }
    }

    fn informers() -> InformersRef {
        Arc::new(SelfPopulatingInformers::new(None, Arc::new(Scheme::new())))
    }

    #[test]
    fn test_controller_without_capabilities_is_skipped() {
        let cfg = Arc::new(RestConfig::new("https://h".parse().unwrap()));
        assert!(!inject_config(&cfg, &Plain));
        assert!(!inject_informers(&informers(), &Plain));
    }

    #[test]
    fn test_capable_controller_receives_dependencies() {
        let c = Wants::default();
        let cfg = Arc::new(RestConfig::new("https://h".parse().unwrap()));

        assert!(inject_informers(&informers(), &c));
        assert!(inject_config(&cfg, &c));
        assert_eq!(*c.hosts.lock().unwrap(), vec!["h".to_string()]);
        assert_eq!(*c.informers.lock().unwrap(), 1);
    }
}
