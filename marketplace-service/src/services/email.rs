use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::SmtpConfig;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Sends the one-time code to `to_email`. `ttl_label` is the human
    /// validity window, e.g. "3 minutes".
    async fn send_verification_code(
        &self,
        to_email: &str,
        code: &str,
        ttl_label: &str,
    ) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl EmailService {
    pub fn new(config: &SmtpConfig) -> Result<Self, anyhow::Error> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| anyhow::anyhow!("Invalid SMTP relay {}: {}", config.host, e))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, port = config.port, "SMTP mailer configured");

        Ok(Self {
            mailer,
            from_email: config.sender.clone(),
        })
    }
}

fn verification_bodies(code: &str, ttl_label: &str) -> (String, String) {
    let plain = format!(
        "Your UF Marketplace verification code is {code}.\n\n\
         The code is valid for {ttl_label}. If you did not request it, you can ignore this email."
    );
    let html = format!(
        r#"<html>
  <body style="font-family: Arial, sans-serif;">
    <h2>Your verification code</h2>
    <p style="font-size: 24px; letter-spacing: 4px;"><strong>{code}</strong></p>
    <p style="color: #666; font-size: 12px;">
      The code is valid for {ttl_label}. If you did not request it, you can ignore this email.
    </p>
  </body>
</html>"#
    );
    (plain, html)
}

#[async_trait]
impl EmailProvider for EmailService {
    async fn send_verification_code(
        &self,
        to_email: &str,
        code: &str,
        ttl_label: &str,
    ) -> Result<(), anyhow::Error> {
        let (plain_body, html_body) = verification_bodies(code, ttl_label);

        let email = Message::builder()
            .from(self.from_email.parse()?)
            .to(to_email.parse()?)
            .subject("Email Verification Code")
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        // SmtpTransport blocks; keep it off the runtime threads.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email)).await?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, "Verification email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %to_email, "Failed to send verification email");
                Err(anyhow::anyhow!("Error sending email: {}", e))
            }
        }
    }
}

/// Records every code it is asked to send instead of delivering it.
#[derive(Default)]
pub struct MockEmailService {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Most recent code sent to `email`.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_verification_code(
        &self,
        to_email: &str,
        code: &str,
        _ttl_label: &str,
    ) -> Result<(), anyhow::Error> {
        if self.fail {
            anyhow::bail!("mock mailer configured to fail");
        }
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("mock mailer lock poisoned"))?
            .push((to_email.to_string(), code.to_string()));
        Ok(())
    }
}
