//! Merchant configuration from the environment and command-line overrides.

use clap::Args;
use vnpay_lib::config::{SANDBOX_API_URL, SANDBOX_PAY_URL};
use vnpay_lib::GatewayConfig;

use crate::ui;

/// Overrides for the `VNPAY_*` environment variables.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Merchant terminal code (overrides VNPAY_TMN_CODE)
    #[arg(long, global = true)]
    pub tmn_code: Option<String>,

    /// Shared secret (overrides VNPAY_SECRET_KEY)
    #[arg(long, global = true)]
    pub secret: Option<String>,

    /// Payment page URL (overrides VNPAY_PAY_URL)
    #[arg(long, global = true)]
    pub pay_url: Option<String>,

    /// Return URL (overrides VNPAY_RETURN_URL)
    #[arg(long, global = true)]
    pub return_url: Option<String>,

    /// Merchant API URL (overrides VNPAY_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Fill unset endpoints with the public sandbox
    #[arg(long, global = true)]
    pub sandbox: bool,
}

impl ConfigArgs {
    /// Environment first, then flags.
    pub fn resolve(&self) -> GatewayConfig {
        let mut config = GatewayConfig::from_env();

        if let Some(tmn_code) = &self.tmn_code {
            config.tmn_code = tmn_code.clone();
        }
        if let Some(secret) = &self.secret {
            config.secret_key = secret.as_str().into();
        }
        if let Some(pay_url) = &self.pay_url {
            config.pay_url = pay_url.clone();
        }
        if let Some(return_url) = &self.return_url {
            config.return_url = return_url.clone();
        }
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }

        if self.sandbox {
            if config.pay_url.is_empty() {
                config.pay_url = SANDBOX_PAY_URL.to_string();
            }
            if config.api_url.is_empty() {
                config.api_url = SANDBOX_API_URL.to_string();
            }
        }

        config
    }
}

/// Show the active configuration without the secret.
pub fn show(config: &GatewayConfig) {
    ui::header("Configuration");
    ui::key_value("Terminal", or_unset(&config.tmn_code));
    ui::key_value(
        "Secret",
        if config.secret_key.is_empty() { "(unset)" } else { "(set)" },
    );
    ui::key_value("Pay URL", or_unset(&config.pay_url));
    ui::key_value("Return URL", or_unset(&config.return_url));
    ui::key_value("API URL", or_unset(&config.api_url));
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}
