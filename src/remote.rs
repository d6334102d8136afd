//! Estadísticas globales opcionales.
//!
//! El endpoint nunca bloquea el flujo principal: cualquier fallo se registra
//! y se ignora.

use reqwest::blocking::Client;
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const STATS_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalStats {
    pub total_files: u64,
    pub total_meta: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDelta {
    pub files_delta: u64,
    pub metadata_delta: u64,
}

pub trait StatsEndpoint {
    fn fetch_global(&self) -> Option<GlobalStats>;
    fn contribute(&self, delta: StatsDelta);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledStats;

impl StatsEndpoint for DisabledStats {
    fn fetch_global(&self) -> Option<GlobalStats> {
        None
    }

    fn contribute(&self, _delta: StatsDelta) {}
}

#[derive(Clone, Debug)]
pub struct HttpStatsEndpoint {
    client: Client,
    url: String,
}

impl HttpStatsEndpoint {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let client = Client::builder()
            .user_agent(concat!("metaremoval/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(STATS_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl StatsEndpoint for HttpStatsEndpoint {
    fn fetch_global(&self) -> Option<GlobalStats> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .and_then(|response| response.error_for_status());

        match response.and_then(|response| response.json::<GlobalStats>()) {
            Ok(stats) => Some(stats),
            Err(error) => {
                debug!(url = %self.url, %error, "estadísticas globales no disponibles");
                None
            }
        }
    }

    fn contribute(&self, delta: StatsDelta) {
        let result = self
            .client
            .post(&self.url)
            .json(&delta)
            .send()
            .and_then(|response| response.error_for_status());

        if let Err(error) = result {
            debug!(url = %self.url, %error, "no se pudieron enviar las estadísticas");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_use_camel_case() -> Result<(), serde_json::Error> {
        let delta = StatsDelta {
            files_delta: 3,
            metadata_delta: 12,
        };
        assert_eq!(
            serde_json::to_string(&delta)?,
            r#"{"filesDelta":3,"metadataDelta":12}"#
        );

        let stats: GlobalStats = serde_json::from_str(r#"{"totalFiles":10}"#)?;
        assert_eq!(
            stats,
            GlobalStats {
                total_files: 10,
                total_meta: 0
            }
        );
        Ok(())
    }

    #[test]
    fn unreachable_endpoint_is_ignored() -> Result<(), reqwest::Error> {
        let endpoint = HttpStatsEndpoint::new("http://127.0.0.1:9/api/stats")?;
        assert_eq!(endpoint.fetch_global(), None);
        endpoint.contribute(StatsDelta {
            files_delta: 1,
            metadata_delta: 1,
        });
        Ok(())
    }

    #[test]
    fn disabled_endpoint_reports_nothing() {
        assert_eq!(DisabledStats.fetch_global(), None);
    }
}
