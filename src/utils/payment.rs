//! Payment-intent gateway.
//!
//! [`StripeGateway`] talks to the Stripe PaymentIntents API over HTTPS with
//! form-encoded bodies. Handlers only see the [`PaymentGateway`] trait so the
//! integration tests can swap in an in-memory fake.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use axum::http::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use campusdesk_config::PaymentConfig;
use campusdesk_core::AppError;

pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Status the gateway reports once the customer's payment went through.
pub const INTENT_SUCCEEDED: &str = "succeeded";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    /// Minor currency units (paise, cents)
    pub amount: i64,
    pub currency: String,
    pub receipt_email: Option<String>,
    pub description: Option<String>,
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == INTENT_SUCCEEDED
    }
}

#[derive(Debug)]
pub enum GatewayError {
    NotConfigured,
    Http(reqwest::Error),
    Api { status: u16, message: String },
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::NotConfigured => write!(f, "Payment gateway is not configured"),
            GatewayError::Http(e) => write!(f, "Payment gateway unreachable: {}", e),
            GatewayError::Api { status, message } => {
                write!(f, "Payment gateway error ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Http(err)
    }
}

impl GatewayError {
    /// Gateway 4xx become client errors; transport failures are 502.
    pub fn into_app_error(self) -> AppError {
        match self {
            GatewayError::Api { status: 404, .. } => {
                AppError::not_found(anyhow::anyhow!("Payment intent not found"))
            }
            GatewayError::Api { status, .. } if (400..500).contains(&status) => {
                AppError::bad_request(self)
            }
            GatewayError::NotConfigured => AppError::new(StatusCode::SERVICE_UNAVAILABLE, self),
            other => AppError::new(StatusCode::BAD_GATEWAY, other),
        }
    }
}

pub trait PaymentGateway: Send + Sync {
    fn create_payment_intent<'a>(
        &'a self,
        request: &'a PaymentIntentRequest,
    ) -> GatewayFuture<'a, PaymentIntent>;

    fn retrieve_payment_intent<'a>(&'a self, intent_id: &'a str)
    -> GatewayFuture<'a, PaymentIntent>;
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

pub struct StripeGateway {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl StripeGateway {
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn intents_url(&self) -> String {
        format!(
            "{}/v1/payment_intents",
            self.config.api_base.trim_end_matches('/')
        )
    }

    async fn parse_response(response: reqwest::Response) -> Result<PaymentIntent, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<PaymentIntent>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

        warn!(status = status.as_u16(), %message, "payment gateway rejected request");
        Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        })
    }

    #[instrument(skip(self, request), fields(amount = request.amount))]
    async fn create(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent, GatewayError> {
        if !self.config.is_configured() {
            return Err(GatewayError::NotConfigured);
        }

        let response = self
            .client
            .post(self.intents_url())
            .bearer_auth(&self.config.secret_key)
            .form(&intent_form(request))
            .send()
            .await?;

        let intent = Self::parse_response(response).await?;
        debug!(intent_id = %intent.id, "payment intent created");
        Ok(intent)
    }

    #[instrument(skip(self))]
    async fn retrieve(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        if !self.config.is_configured() {
            return Err(GatewayError::NotConfigured);
        }

        let response = self
            .client
            .get(format!("{}/{}", self.intents_url(), intent_id))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        Self::parse_response(response).await
    }
}

impl PaymentGateway for StripeGateway {
    fn create_payment_intent<'a>(
        &'a self,
        request: &'a PaymentIntentRequest,
    ) -> GatewayFuture<'a, PaymentIntent> {
        Box::pin(self.create(request))
    }

    fn retrieve_payment_intent<'a>(
        &'a self,
        intent_id: &'a str,
    ) -> GatewayFuture<'a, PaymentIntent> {
        Box::pin(self.retrieve(intent_id))
    }
}

/// Form fields for `POST /v1/payment_intents`, metadata flattened as `metadata[key]`.
pub fn intent_form(request: &PaymentIntentRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), request.amount.to_string()),
        ("currency".to_string(), request.currency.clone()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];
    if let Some(email) = &request.receipt_email {
        form.push(("receipt_email".to_string(), email.clone()));
    }
    if let Some(description) = &request.description {
        form.push(("description".to_string(), description.clone()));
    }
    for (key, value) in &request.metadata {
        form.push((format!("metadata[{}]", key), value.clone()));
    }
    form
}
