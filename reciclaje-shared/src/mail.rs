//! Outgoing transactional e-mail
//!
//! Mail goes through an HTTP mail API: one JSON `POST` per message,
//! authenticated with a bearer key. Deployments without mail settings get a
//! [`DisabledMailer`] that only logs. Callers treat every send as best effort.
//!
//! # Example
//!
//! ```no_run
//! use reciclaje_shared::mail::{HttpMailer, MailConfig, Mailer, OutgoingEmail};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mailer = HttpMailer::new(MailConfig {
//!     api_url: "https://mail.example.com/v1/send".to_string(),
//!     api_key: "key".to_string(),
//!     from: "no-reply@example.com".to_string(),
//! })?;
//!
//! mailer
//!     .send(OutgoingEmail {
//!         to: "ana@example.com".to_string(),
//!         subject: "Hola".to_string(),
//!         text: "Bienvenida".to_string(),
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to build mail client: {0}")]
    Client(String),

    #[error("Mail request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Mail API rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Settings of the HTTP mail API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,

    /// Sender address
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Something that delivers e-mail
#[async_trait]
pub trait Mailer: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Sends and logs failures instead of returning them
pub async fn send_best_effort(mailer: &dyn Mailer, email: OutgoingEmail) {
    let to = email.to.clone();

    if let Err(e) = mailer.send(email).await {
        warn!(mailer = mailer.name(), to = %to, error = %e, "Failed to send e-mail");
    }
}

/// Confirmation sent after a password change
pub fn password_changed_email(to: &str, name: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Tu contraseña fue actualizada".to_string(),
        text: format!(
            "Hola {},\n\nTe confirmamos que la contraseña de tu cuenta fue cambiada. \
             Si no fuiste tú, contáctanos de inmediato.\n",
            name
        ),
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Mailer backed by an HTTP mail API
pub struct HttpMailer {
    config: MailConfig,
    http: reqwest::Client,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("reciclaje/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MailError::Client(e.to_string()))?;

        Ok(Self { config, http })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&SendRequest {
                from: &self.config.from,
                to: &email.to,
                subject: &email.subject,
                text: &email.text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(to = %email.to, subject = %email.subject, "E-mail sent");
        Ok(())
    }
}

/// Mailer used when no mail API is configured
#[derive(Debug, Default)]
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        debug!(to = %email.to, subject = %email.subject, "Mail disabled, dropping e-mail");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    async fn spawn_fake_api(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route(
                "/send",
                post(
                    move |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        captured.lock().unwrap().push((auth, body));
                        status
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/send", addr), captured)
    }

    fn mailer(api_url: String) -> HttpMailer {
        HttpMailer::new(MailConfig {
            api_url,
            api_key: "test-key".to_string(),
            from: "no-reply@reciclaje.test".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_http_mailer_posts_json_with_bearer() {
        let (url, captured) = spawn_fake_api(StatusCode::OK).await;

        mailer(url)
            .send(password_changed_email("ana@example.com", "Ana"))
            .await
            .unwrap();

        let requests = captured.lock().unwrap();
        assert_eq!(requests.len(), 1);

        let (auth, body) = &requests[0];
        assert_eq!(auth.as_deref(), Some("Bearer test-key"));
        assert_eq!(body["from"], "no-reply@reciclaje.test");
        assert_eq!(body["to"], "ana@example.com");
        assert_eq!(body["subject"], "Tu contraseña fue actualizada");
        assert!(body["text"].as_str().unwrap().contains("Hola Ana"));
    }

    #[tokio::test]
    async fn test_http_mailer_reports_rejection() {
        let (url, _) = spawn_fake_api(StatusCode::UNPROCESSABLE_ENTITY).await;

        let result = mailer(url).send(password_changed_email("ana@example.com", "Ana")).await;

        assert!(matches!(result, Err(MailError::Rejected { status: 422, .. })));
    }

    #[tokio::test]
    async fn test_disabled_mailer_accepts_everything() {
        let mailer = DisabledMailer;
        assert_eq!(mailer.name(), "disabled");
        assert!(mailer.send(password_changed_email("x@example.com", "X")).await.is_ok());

        send_best_effort(&mailer, password_changed_email("x@example.com", "X")).await;
    }
}
