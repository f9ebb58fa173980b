use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared_types::{
    AssignLeadRequest, CreateLeadRequest, ErrorResponse, Lead, LeadsResponse, ListLeadsQuery,
    UpdateLeadRequest,
};
use std::time::Duration;

use super::LeadApi;
use crate::config::ApiSettings;
use crate::error::LeadApiError;

/// REST client for the lead endpoints of the admin API
pub struct HttpLeadApi {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpLeadApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, LeadApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            auth_token: settings.auth_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, LeadApiError> {
        let response = Self::check(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(builder: RequestBuilder) -> Result<(), LeadApiError> {
        Self::check(builder.send().await?).await?;
        Ok(())
    }

    async fn check(response: Response) -> Result<Response, LeadApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        tracing::debug!("Lead API returned {}: {}", status, message);

        Err(LeadApiError::from_status(status.as_u16(), message))
    }
}

/// Extracts the message of an `{"error": "..."}` body, falling back to the raw text.
fn error_message(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => Some(parsed.error),
        Err(_) => Some(body.trim().to_string()),
    }
}

#[async_trait]
impl LeadApi for HttpLeadApi {
    async fn list(&self, query: &ListLeadsQuery) -> Result<LeadsResponse, LeadApiError> {
        Self::send_json(self.request(Method::GET, "leads").query(query)).await
    }

    async fn get(&self, id: &str) -> Result<Lead, LeadApiError> {
        Self::send_json(self.request(Method::GET, &format!("leads/{}", id))).await
    }

    async fn create(&self, request: &CreateLeadRequest) -> Result<Lead, LeadApiError> {
        Self::send_json(self.request(Method::POST, "leads").json(request)).await
    }

    async fn update(&self, id: &str, request: &UpdateLeadRequest) -> Result<Lead, LeadApiError> {
        Self::send_json(
            self.request(Method::PUT, &format!("leads/{}", id))
                .json(request),
        )
        .await
    }

    async fn assign(&self, id: &str, agent_id: &str) -> Result<Lead, LeadApiError> {
        let body = AssignLeadRequest {
            agent_id: agent_id.to_string(),
        };
        Self::send_json(
            self.request(Method::POST, &format!("leads/{}/assign", id))
                .json(&body),
        )
        .await
    }

    async fn delete(&self, id: &str) -> Result<(), LeadApiError> {
        Self::send_empty(self.request(Method::DELETE, &format!("leads/{}", id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{LeadPriority, LeadStage};

    fn settings(base_url: &str) -> ApiSettings {
        ApiSettings {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            auth_token: Some("secret".to_string()),
        }
    }

    #[test]
    fn test_url_joining() {
        let api = HttpLeadApi::new(&settings("http://localhost:4000/api/")).unwrap();
        assert_eq!(api.url("leads"), "http://localhost:4000/api/leads");
        assert_eq!(api.url("/leads/abc/assign"), "http://localhost:4000/api/leads/abc/assign");
    }

    #[test]
    fn test_list_query_string() {
        let api = HttpLeadApi::new(&settings("http://localhost:4000/api")).unwrap();
        let query = ListLeadsQuery {
            search: Some("amira".to_string()),
            stage: Some(LeadStage::NewLead),
            priority: Some(LeadPriority::Urgent),
            offset: 0,
            limit: 25,
            ..Default::default()
        };

        let request = api
            .request(Method::GET, "leads")
            .query(&query)
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "http://localhost:4000/api/leads?search=amira&stage=NEW_LEAD&priority=URGENT&offset=0&limit=25"
        );
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer secret"
        );
    }

    #[test]
    fn test_error_message_parsing() {
        assert_eq!(
            error_message(r#"{"error":"Lead not found"}"#),
            Some("Lead not found".to_string())
        );
        assert_eq!(error_message("upstream down"), Some("upstream down".to_string()));
        assert_eq!(error_message("  "), None);
    }
}
