use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, instrument};

use campusdesk_config::EmailConfig;
use campusdesk_core::AppError;

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    #[instrument(skip(self, reset_token))]
    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        reset_token: &str,
    ) -> Result<(), AppError> {
        let reset_link = self.config.reset_link(reset_token);

        let text_body = format!(
            "Hi {},\n\n\
             We received a request to reset your Campusdesk password.\n\n\
             Open the link below to choose a new one:\n\
             {}\n\n\
             The link is valid for 1 hour.\n\n\
             If you did not ask for this, you can ignore this email.",
            to_name, reset_link
        );
        let html_body = layout(
            "#1D4ED8",
            "Reset your password",
            &format!(
                r#"<p>Hi <strong>{name}</strong>,</p>
<p>We received a request to reset your Campusdesk password.</p>
<p style="text-align:center;margin:28px 0;">
  <a href="{link}" style="padding:12px 32px;background:#1D4ED8;color:#fff;text-decoration:none;border-radius:6px;">Reset password</a>
</p>
<p style="font-size:13px;word-break:break-all;">{link}</p>
<p><strong>The link is valid for 1 hour.</strong></p>"#,
                name = to_name,
                link = reset_link
            ),
        );

        self.send_email(to_email, "Reset your Campusdesk password", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self))]
    pub async fn send_password_changed_email(
        &self,
        to_email: &str,
        to_name: &str,
    ) -> Result<(), AppError> {
        let text_body = format!(
            "Hi {},\n\n\
             Your Campusdesk password was just changed.\n\n\
             If this wasn't you, contact the college office immediately.",
            to_name
        );
        let html_body = layout(
            "#047857",
            "Password changed",
            &format!(
                r#"<p>Hi <strong>{}</strong>,</p>
<p>Your Campusdesk password was just changed.</p>
<p style="background:#FEF3C7;border-left:4px solid #F59E0B;padding:12px;">If this wasn't you, contact the college office immediately.</p>"#,
                to_name
            ),
        );

        self.send_email(to_email, "Your password was changed", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, html_body, text_body))]
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            info!(to = %to_email, subject, "SMTP disabled, email not sent");
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| {
                    AppError::internal_error(format!("Failed to create SMTP relay: {}", e))
                })?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal_error(format!("Task join error: {}", e)))?
            .map_err(|e| AppError::internal_error(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

fn layout(accent: &str, title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>{title}</title></head>
<body style="margin:0;padding:20px;font-family:Arial,sans-serif;background:#f4f4f4;">
  <table width="600" align="center" cellpadding="0" cellspacing="0" style="background:#fff;border-radius:8px;">
    <tr><td style="background:{accent};padding:24px;text-align:center;color:#fff;font-size:24px;">Campusdesk</td></tr>
    <tr><td style="padding:32px;color:#444;font-size:15px;line-height:1.5;">
      <h2 style="margin-top:0;color:#222;">{title}</h2>
      {content}
    </td></tr>
    <tr><td style="padding:16px;text-align:center;color:#999;font-size:12px;border-top:1px solid #eee;">Automated message from Campusdesk. Please do not reply.</td></tr>
  </table>
</body>
</html>"#
    )
}
