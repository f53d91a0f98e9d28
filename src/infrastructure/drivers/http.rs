use crate::domain::error::QwarmError;
use crate::domain::model::{DriverId, DriverResponse, Row};
use crate::domain::traits::Driver;
use crate::infrastructure::config::HttpSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

// Query-service response body: either a flat row list or grouped
// recordsets, plus an optional service-side error message.
#[derive(Deserialize, Debug)]
struct QueryServiceResponse {
    rows: Option<Vec<Row>>,
    recordsets: Option<Vec<Vec<Row>>>,
    error: Option<String>,
}

/// Driver for a remote query service spoken to over HTTP.
///
/// The service accepts `{"query": "..."}` and answers with rows or
/// recordsets; its per-request timeout lives in the client configuration,
/// so a timeout surfaces like any other transport failure.
pub struct HttpDriver {
    client: Client,
    endpoint: String,
}

impl HttpDriver {
    pub fn new(settings: &HttpSettings) -> Result<Self, QwarmError> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .timeout(std::time::Duration::from_secs(settings.timeout_seconds))
            .user_agent("qwarm/0.1.0")
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Driver for HttpDriver {
    fn id(&self) -> DriverId {
        DriverId::Http
    }

    fn connected(&self) -> bool {
        !self.endpoint.is_empty()
    }

    async fn run_query(&self, query: &str) -> Result<DriverResponse, QwarmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?
            .error_for_status()?
            .json::<QueryServiceResponse>()
            .await?;

        if let Some(message) = response.error {
            return Err(QwarmError::Api(message));
        }

        Ok(map_response(response))
    }
}

fn map_response(response: QueryServiceResponse) -> DriverResponse {
    if let Some(recordsets) = response.recordsets {
        return DriverResponse::MultiSet(recordsets);
    }
    match response.rows {
        Some(rows) => DriverResponse::SingleSet(rows),
        None => DriverResponse::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_flat_rows_to_single_set() {
        let response: QueryServiceResponse =
            serde_json::from_str(r#"{"rows": [{"id": 1}]}"#).unwrap();
        assert!(matches!(
            map_response(response),
            DriverResponse::SingleSet(rows) if rows.len() == 1
        ));
    }

    #[test]
    fn maps_grouped_recordsets_to_multi_set() {
        let response: QueryServiceResponse =
            serde_json::from_str(r#"{"recordsets": [[{"id": 1}], [{"id": 2}]]}"#).unwrap();
        assert!(matches!(
            map_response(response),
            DriverResponse::MultiSet(groups) if groups.len() == 2
        ));
    }

    #[test]
    fn maps_bare_body_to_empty() {
        let response: QueryServiceResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(map_response(response), DriverResponse::Empty));
    }
}
