use async_trait::async_trait;
use tracing::info;

use crate::error::ApiError;

/// Outbound mail seam. Production deployments plug in a real delivery
/// backend; the default implementation writes the message to the log, which
/// is all local development needs.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(
        &self,
        email: &str,
        username: &str,
        link: &str,
    ) -> Result<(), ApiError>;
}

/// Console-style mailer: the verification link ends up in the structured log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(
        &self,
        email: &str,
        username: &str,
        link: &str,
    ) -> Result<(), ApiError> {
        info!(
            email = email,
            username = username,
            link = link,
            "Verification email (log delivery)"
        );
        Ok(())
    }
}
