use async_trait::async_trait;
use reqwest::{header, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::{
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{debug, info};

use crate::{
    config::Config,
    error::ProviderError,
    paypal::{
        provider::PayoutProvider,
        types::{
            AccessTokenResponse, BatchHeader, CreatePayoutResponse, ErrorBody, PayoutBatch,
            PayoutBatchRequest,
        },
    },
};

/// Refresh the access token this long before PayPal says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Items requested per page when reading a batch back. Batches we create never
/// exceed the provider's 500 item submission limit, so one page covers them.
const BATCH_PAGE_SIZE: usize = 1000;

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// PayPal Payouts REST client.
pub struct PaypalClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl PaypalClient {
    pub fn new(
        base_url: &str,
        client_id: &str,
        client_secret: &str,
        timeout: Duration,
    ) -> std::result::Result<Self, ProviderError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token: Mutex::new(None),
        })
    }

    pub fn from_config(config: &Config) -> std::result::Result<Self, ProviderError> {
        Self::new(
            &config.paypal_base_url(),
            &config.paypal.client_id,
            &config.paypal.client_secret,
            config.http_timeout(),
        )
    }

    fn cached_token(&self) -> Option<String> {
        let guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .filter(|t| t.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN)
            .map(|t| t.access_token.clone())
    }

    /// OAuth2 client-credentials token, cached until shortly before expiry.
    async fn access_token(&self) -> std::result::Result<String, ProviderError> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        debug!("Requesting PayPal access token");
        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(match classify_error(status, &body) {
                ProviderError::Api { message, .. } => ProviderError::Auth(message),
                other => other,
            });
        }

        let token: AccessTokenResponse = decode(&body)?;
        let mut guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        *guard = token_expiry(Instant::now(), token.expires_in).map(|expires_at| CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }

    /// `POST /v1/payments/payouts`, keyed for idempotency by the request's
    /// `sender_batch_id`.
    fn create_request(&self, request: &PayoutBatchRequest) -> RequestBuilder {
        self.http
            .post(format!("{}/v1/payments/payouts", self.base_url))
            .header("PayPal-Request-Id", request.sender_batch_id())
            .json(request)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<T, ProviderError> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        decode(&body)
    }
}

#[async_trait]
impl PayoutProvider for PaypalClient {
    async fn create_batch(
        &self,
        request: &PayoutBatchRequest,
    ) -> std::result::Result<BatchHeader, ProviderError> {
        let response: CreatePayoutResponse = self.send(self.create_request(request)).await?;
        info!(
            "Created payout batch {} ({} items, sender batch {})",
            response.batch_header.payout_batch_id,
            request.items.len(),
            request.sender_batch_id()
        );

        Ok(response.batch_header)
    }

    async fn get_batch(
        &self,
        payout_batch_id: &str,
    ) -> std::result::Result<PayoutBatch, ProviderError> {
        let builder = self
            .http
            .get(format!(
                "{}/v1/payments/payouts/{}",
                self.base_url, payout_batch_id
            ))
            .query(&[("page_size", BATCH_PAGE_SIZE)]);

        let batch: PayoutBatch = self.send(builder).await?;
        debug!(
            "Fetched payout batch {}: {} ({} items)",
            payout_batch_id,
            batch.batch_header.batch_status,
            batch.items.len()
        );

        Ok(batch)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> std::result::Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Map a non-2xx response onto a [`ProviderError`].
pub(crate) fn classify_error(status: StatusCode, body: &str) -> ProviderError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let name = parsed
        .name
        .or(parsed.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("UNKNOWN").to_string());
    let message = parsed
        .message
        .or(parsed.error_description)
        .unwrap_or_else(|| body.trim().to_string());

    if status == StatusCode::NOT_FOUND || name == "RESOURCE_NOT_FOUND" {
        return ProviderError::NotFound(message);
    }

    if status == StatusCode::UNAUTHORIZED {
        return ProviderError::Auth(message);
    }

    ProviderError::Api {
        status: status.as_u16(),
        name,
        message,
        debug_id: parsed.debug_id,
    }
}

/// `None` when `expires_in` does not fit in an `Instant`; such a token is used
/// once and not cached.
fn token_expiry(now: Instant, expires_in: u64) -> Option<Instant> {
    now.checked_add(Duration::from_secs(expires_in))
}
