use crate::error::QueryError;
use crate::sanitize::ExtractedQuery;

/// Client for the downstream Northwind OData service. Holds the shared
/// `reqwest::Client` and the fixed base URL from configuration.
#[derive(Clone)]
pub struct OdataClient {
    http: reqwest::Client,
    base_url: String,
}

impl OdataClient {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Issue a sanitized path+query suffix against the service and pass the
    /// JSON body through verbatim.
    pub async fn query_suffix(&self, suffix: &str) -> Result<serde_json::Value, QueryError> {
        let url = self.suffix_url(suffix);
        self.get_json(&url).await
    }

    /// Issue a structured entity+filter query. The filter expression is
    /// percent-encoded into the `$filter` query parameter.
    pub async fn query_entity(&self, query: &ExtractedQuery) -> Result<serde_json::Value, QueryError> {
        let url = self.entity_url(query)?;
        self.get_json(url.as_str()).await
    }

    /// Fetch the service's `$metadata` document (raw XML).
    pub async fn fetch_metadata(&self) -> Result<String, QueryError> {
        let url = format!("{}/$metadata", self.base_url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(QueryError::DataService {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    fn suffix_url(&self, suffix: &str) -> String {
        format!("{}/{}", self.base_url, suffix)
    }

    fn entity_url(&self, query: &ExtractedQuery) -> Result<reqwest::Url, QueryError> {
        let mut url = reqwest::Url::parse(&format!("{}/{}", self.base_url, query.entity))
            .map_err(|e| QueryError::MalformedOutput {
                reason: format!("entity does not form a valid URL: {}", e),
                raw: query.entity.clone(),
            })?;

        if !query.filter.is_empty() {
            url.query_pairs_mut().append_pair("$filter", &query.filter);
        }

        Ok(url)
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, QueryError> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::DataService {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(transport_error)
    }
}

// A connection-level failure has no downstream status; surface it as a
// gateway error so the caller still sees one error shape for this stage.
fn transport_error(e: reqwest::Error) -> QueryError {
    QueryError::DataService {
        status: 502,
        body: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OdataClient {
        OdataClient::new(
            reqwest::Client::new(),
            "https://services.odata.org/V4/Northwind/Northwind.svc".to_string(),
        )
    }

    #[test]
    fn test_suffix_url_concatenation() {
        let url = client().suffix_url("Customers?$filter=Country eq 'Germany'");
        assert_eq!(
            url,
            "https://services.odata.org/V4/Northwind/Northwind.svc/Customers?$filter=Country eq 'Germany'"
        );
    }

    #[test]
    fn test_entity_url_encodes_filter() {
        let url = client()
            .entity_url(&ExtractedQuery {
                entity: "Customers".to_string(),
                filter: "Country eq 'Germany'".to_string(),
            })
            .unwrap();

        let url = url.as_str();
        assert!(url.starts_with("https://services.odata.org/V4/Northwind/Northwind.svc/Customers?%24filter="));
        // Quotes must not survive unencoded in the query string
        assert!(!url.contains('\''));
        assert!(url.contains("%27Germany%27"));
    }

    #[test]
    fn test_entity_url_without_filter() {
        let url = client()
            .entity_url(&ExtractedQuery {
                entity: "Products".to_string(),
                filter: String::new(),
            })
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://services.odata.org/V4/Northwind/Northwind.svc/Products"
        );
    }

    #[test]
    fn test_trailing_slash_trimmed_from_base() {
        let client = OdataClient::new(
            reqwest::Client::new(),
            "https://example.com/svc/".to_string(),
        );
        assert_eq!(client.suffix_url("Orders"), "https://example.com/svc/Orders");
    }
}
