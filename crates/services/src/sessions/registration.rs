use std::sync::Arc;

use tracing::{info, warn};

use proctor_core::model::{
    Candidate, LinkId, LinkInfo, RecoveryRecord, SessionConfig, SessionId,
};
use storage::repository::{RecoveryStore, load_record, save_record};

use crate::api::SessionApi;
use crate::error::RegistrationError;

/// Landing flow: describe a link, register the candidate, and hand over to the test view.
#[derive(Clone)]
pub struct RegistrationService {
    api: Arc<dyn SessionApi>,
    recovery: Arc<dyn RecoveryStore>,
}

impl RegistrationService {
    #[must_use]
    pub fn new(api: Arc<dyn SessionApi>, recovery: Arc<dyn RecoveryStore>) -> Self {
        Self { api, recovery }
    }

    /// # Errors
    ///
    /// Returns `RegistrationError::Api` if the link is unknown, used up or expired.
    pub async fn describe(&self, link_id: &LinkId) -> Result<LinkInfo, RegistrationError> {
        Ok(self.api.validate(link_id).await?)
    }

    /// Validates the form, opens a session and writes the recovery record for it.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::Candidate` for invalid fields without contacting the
    /// service, `RegistrationError::Api` if the service refuses, and
    /// `RegistrationError::Storage` if the recovery record cannot be written.
    pub async fn register(
        &self,
        link_id: &LinkId,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<SessionConfig, RegistrationError> {
        let candidate = Candidate::new(name, email, phone)?;
        let config = self.api.start(link_id, &candidate).await?;
        save_record(self.recovery.as_ref(), &RecoveryRecord::started(&config)).await?;
        info!(
            link_id = %link_id,
            session_id = %config.session_id(),
            total_questions = config.total_questions(),
            "session started"
        );
        Ok(config)
    }

    /// Session recorded in this window, if any.
    pub async fn active_session(&self) -> Option<SessionId> {
        match load_record(self.recovery.as_ref()).await {
            Ok(record) => record.map(|record| record.session_id),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable recovery record");
                None
            }
        }
    }

    /// Forgets the attempt in this window.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::Storage` if the record cannot be removed.
    pub async fn finish(&self) -> Result<(), RegistrationError> {
        self.recovery.clear().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::model::{RecoveryKey, TabScope};
    use proctor_core::time::fixed_clock;
    use storage::repository::InMemoryRecoveryStore;

    use crate::api::{InMemorySessionApi, LinkSpec, SeedQuestion};
    use crate::error::SessionApiError;

    fn service() -> (InMemorySessionApi, InMemoryRecoveryStore, RegistrationService) {
        let api = InMemorySessionApi::new(fixed_clock());
        api.add_link(
            LinkId::new("quiz").unwrap(),
            LinkSpec::new(
                "Quiz",
                10,
                vec![
                    SeedQuestion::new("One", &["a", "b"], 0),
                    SeedQuestion::new("Two", &["a", "b"], 1),
                ],
            ),
        );
        let store = InMemoryRecoveryStore::new(TabScope::generate());
        let service = RegistrationService::new(Arc::new(api.clone()), Arc::new(store.clone()));
        (api, store, service)
    }

    #[tokio::test]
    async fn register_writes_the_recovery_record() {
        let (_api, store, service) = service();
        let link = LinkId::new("quiz").unwrap();

        let info = service.describe(&link).await.unwrap();
        assert_eq!(info.test_name, "Quiz");
        assert_eq!(info.total_questions, 2);

        let config = service
            .register(&link, " Alan Turing ", "alan@example.com", "+442079460000")
            .await
            .unwrap();
        assert_eq!(service.active_session().await.as_ref(), Some(config.session_id()));
        assert_eq!(
            store.get(RecoveryKey::TotalTimeRemaining).await.unwrap(),
            Some("20".to_string())
        );

        service.finish().await.unwrap();
        assert_eq!(service.active_session().await, None);
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_the_service() {
        let (api, _store, service) = service();
        let link = LinkId::new("quiz").unwrap();
        let err = service
            .register(&link, "Al", "not-an-email", "5551234567")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Candidate(_)));
        assert_eq!(err.message(), "enter a valid email address");
        assert_eq!(service.active_session().await, None);

        let config = service
            .register(&link, "Alan Turing", "alan@example.com", "5551234567")
            .await
            .unwrap();
        assert_eq!(config.session_id().as_str(), "session-1");
        assert_eq!(api.attempts(config.session_id()), Vec::new());
    }

    #[tokio::test]
    async fn unknown_link_surfaces_the_service_message() {
        let (_api, _store, service) = service();
        let err = service
            .describe(&LinkId::new("missing").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Api(SessionApiError::NotFound(_))
        ));
        assert_eq!(err.message(), "Test link not found");
    }
}
