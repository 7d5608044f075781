use std::env;

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    /// Stripe secret key. Empty disables the gateway.
    pub secret_key: String,
    pub api_base: String,
    /// ISO currency code, lowercase as the gateway expects
    pub currency: String,
}

impl PaymentConfig {
    pub fn from_env() -> Self {
        Self {
            secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            currency: env::var("PAYMENT_CURRENCY")
                .unwrap_or_else(|_| "inr".to_string())
                .to_lowercase(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }
}
