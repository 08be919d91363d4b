use std::sync::Arc;

use log::*;
use mp_common::Paise;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::PayrailConfig,
    data_objects::{NewPayrailOrder, NewPayrailPayout, PayrailOrder, PayrailPayout},
    PayrailApiError,
};

/// Thin client for the Payrail REST API. Authentication is HTTP Basic with the key id and secret; every
/// call goes through [`PayrailApi::rest_query`], which handles serialization and error unwrapping.
#[derive(Clone)]
pub struct PayrailApi {
    config: PayrailConfig,
    client: Arc<Client>,
}

impl PayrailApi {
    pub fn new(config: PayrailConfig) -> Result<Self, PayrailApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PayrailApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, PayrailApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()));
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| PayrailApiError::RestResponse(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| PayrailApiError::Json(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| PayrailApiError::RestResponse(e.to_string()))?;
            // Failures come wrapped as {"error": {"code", "description"}}. Surface the description when present.
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["description"].as_str().map(String::from))
                .unwrap_or(body);
            Err(PayrailApiError::Query { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    pub async fn create_order(
        &self,
        amount: Paise,
        currency: &str,
        receipt: &str,
    ) -> Result<PayrailOrder, PayrailApiError> {
        let body = NewPayrailOrder {
            amount,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
            notes: None,
        };
        debug!("Creating order for {amount} ({receipt})");
        let order =
            self.rest_query::<PayrailOrder, NewPayrailOrder>(Method::POST, "/v1/orders", &[], Some(body)).await?;
        info!("Created order {} for {}. Status: {}", order.id, order.amount, order.status);
        Ok(order)
    }

    pub async fn create_payout(
        &self,
        amount: Paise,
        currency: &str,
        reference: &str,
    ) -> Result<PayrailPayout, PayrailApiError> {
        let body = NewPayrailPayout {
            amount,
            currency: currency.to_string(),
            reference_id: reference.to_string(),
            narration: None,
        };
        debug!("Creating payout for {amount} ({reference})");
        let payout =
            self.rest_query::<PayrailPayout, NewPayrailPayout>(Method::POST, "/v1/payouts", &[], Some(body)).await?;
        info!("Created payout {}. Status: {}", payout.id, payout.status);
        Ok(payout)
    }
}
