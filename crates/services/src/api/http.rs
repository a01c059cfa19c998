use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use proctor_core::model::{
    Candidate, LinkId, LinkInfo, OptionIndex, QuestionPresentation, SessionConfig, SessionId,
};

use super::wire::{
    QuestionResponse, StartRequest, StartResponse, SubmitRequest, SubmitResponse,
    TabSwitchResponse, ValidateResponse, error_detail,
};
use super::{SessionApi, SubmitReceipt};
use crate::config::ServiceConfig;
use crate::error::SessionApiError;

/// `SessionApi` over the service's JSON HTTP interface.
#[derive(Clone)]
pub struct HttpSessionApi {
    client: Client,
    config: ServiceConfig,
}

impl HttpSessionApi {
    /// # Errors
    ///
    /// Returns `SessionApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: ServiceConfig) -> Result<Self, SessionApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SessionApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            debug!(status = status.as_u16(), %detail, "session service refused request");
            return Err(SessionApiError::from_detail(status.as_u16(), detail));
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| SessionApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn validate(&self, link_id: &LinkId) -> Result<LinkInfo, SessionApiError> {
        let url = self.config.endpoint(&format!("test/{link_id}/validate"));
        let response = self.client.get(url).send().await?;
        let body: ValidateResponse = Self::decode(response).await?;
        Ok(body.into_link_info(link_id.clone()))
    }

    async fn start(
        &self,
        link_id: &LinkId,
        candidate: &Candidate,
    ) -> Result<SessionConfig, SessionApiError> {
        let url = self.config.endpoint(&format!("test/{link_id}/start"));
        let response = self
            .client
            .post(url)
            .json(&StartRequest::from(candidate))
            .send()
            .await?;
        let body: StartResponse = Self::decode(response).await?;
        body.into_config()
    }

    async fn get_question(
        &self,
        session_id: &SessionId,
    ) -> Result<QuestionPresentation, SessionApiError> {
        let url = self
            .config
            .endpoint(&format!("test/session/{session_id}/question"));
        let response = self.client.get(url).send().await?;
        let body: QuestionResponse = Self::decode(response).await?;
        body.into_presentation()
    }

    async fn submit_answer(
        &self,
        session_id: &SessionId,
        selected: Option<OptionIndex>,
    ) -> Result<SubmitReceipt, SessionApiError> {
        let url = self
            .config
            .endpoint(&format!("test/session/{session_id}/answer"));
        let payload = SubmitRequest {
            selected_index: selected.map(OptionIndex::value),
        };
        let response = self.client.post(url).json(&payload).send().await?;
        let body: SubmitResponse = Self::decode(response).await?;
        body.into_receipt()
    }

    async fn log_tab_switch(&self, session_id: &SessionId) -> Result<bool, SessionApiError> {
        let url = self
            .config
            .endpoint(&format!("test/session/{session_id}/tab-switch"));
        let response = self.client.post(url).send().await?;
        let body: TabSwitchResponse = Self::decode(response).await?;
        Ok(body.logged)
    }
}
