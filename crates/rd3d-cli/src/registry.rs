use crate::config::RegistrySettings;
use crate::error::Result;
use rd3d::core::structure::RegistryProbe;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Checks Protein Data Bank codes against the RCSB file service.
///
/// The lookup is synchronous for the caller; it runs on the CLI's runtime
/// and gives up after the configured timeout.
#[derive(Debug, Clone)]
pub struct RcsbRegistry {
    client: reqwest::Client,
    url_template: String,
    handle: Handle,
}

impl RcsbRegistry {
    pub fn new(settings: &RegistrySettings, handle: Handle) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("rd3d-calc/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url_template: settings.url_template.clone(),
            handle,
        })
    }

    pub fn url_for(&self, code: &str) -> String {
        self.url_template.replace("{code}", code)
    }

    async fn fetch_status(&self, url: &str) -> reqwest::Result<reqwest::StatusCode> {
        let response = self.client.get(url).send().await?;
        Ok(response.status())
    }
}

impl RegistryProbe for RcsbRegistry {
    fn code_exists(&self, code: &str) -> bool {
        let url = self.url_for(code);
        debug!("Querying PDB registry: {}", url);

        let outcome =
            tokio::task::block_in_place(|| self.handle.block_on(self.fetch_status(&url)));
        match outcome {
            Ok(status) if status.is_success() => true,
            Ok(status) => {
                debug!("Registry answered {} for '{}'.", status, code);
                false
            }
            Err(e) if e.is_timeout() => {
                warn!("PDB registry lookup for '{}' timed out.", code);
                false
            }
            Err(e) => {
                warn!("PDB registry lookup for '{}' failed: {}", code, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(url_template: &str) -> RegistrySettings {
        RegistrySettings {
            url_template: url_template.to_string(),
            timeout: Duration::from_millis(500),
            offline: false,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn url_substitutes_code() {
        let registry = RcsbRegistry::new(
            &settings("https://files.rcsb.org/view/{code}.pdb"),
            Handle::current(),
        )
        .unwrap();
        assert_eq!(
            registry.url_for("1AKE"),
            "https://files.rcsb.org/view/1AKE.pdb"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn unreachable_registry_counts_as_not_found() {
        let registry =
            RcsbRegistry::new(&settings("http://127.0.0.1:9/{code}.pdb"), Handle::current())
                .unwrap();
        assert!(!registry.code_exists("1AKE"));
    }
}
