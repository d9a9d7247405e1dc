//! Farm API client for production, delivery and price records
//!
//! The farm API owns persistence. This service only reads rows from it and
//! forwards drafts the core has already validated and converted.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    AnimalRef, DateRange, DeliveryRecord, MilkPrice, NewDelivery, NewProduction,
    ProductionRecord, TenantBillingDefaults,
};
use uuid::Uuid;

use crate::config::FarmApiConfig;
use crate::error::{AppError, AppResult};

/// Header carrying the tenant on every request
pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// Query filter shared by the list endpoints
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RecordFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animal_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_id: Option<Uuid>,
}

impl RecordFilter {
    /// Filter covering `range`, widened by a day on each side
    ///
    /// The farm API filters on UTC dates; the extra days keep rows near
    /// midnight in the local calendar, which the core buckets exactly.
    pub fn around(range: DateRange) -> Self {
        Self {
            date_from: range.start.pred_opt(),
            date_to: range.end.succ_opt(),
            ..Default::default()
        }
    }

    pub fn with_buyer(mut self, buyer_id: Option<Uuid>) -> Self {
        self.buyer_id = buyer_id;
        self
    }

    pub fn with_animal(mut self, animal_id: Option<Uuid>) -> Self {
        self.animal_id = animal_id;
        self
    }
}

/// Source of farm records
#[async_trait]
pub trait FarmDataSource: Send + Sync {
    async fn list_productions(&self, filter: &RecordFilter) -> AppResult<Vec<ProductionRecord>>;

    async fn list_deliveries(&self, filter: &RecordFilter) -> AppResult<Vec<DeliveryRecord>>;

    async fn list_prices(&self, filter: &RecordFilter) -> AppResult<Vec<MilkPrice>>;

    /// Tenant billing settings, `None` when the tenant has none
    async fn billing_defaults(&self) -> AppResult<Option<TenantBillingDefaults>>;

    async fn list_animals(&self) -> AppResult<Vec<AnimalRef>>;

    async fn get_production(&self, id: Uuid) -> AppResult<ProductionRecord>;

    async fn get_delivery(&self, id: Uuid) -> AppResult<DeliveryRecord>;

    /// Persist a batch as one unit
    async fn create_productions(&self, drafts: &[NewProduction]) -> AppResult<Vec<ProductionRecord>>;

    async fn create_delivery(&self, draft: &NewDelivery) -> AppResult<DeliveryRecord>;

    async fn update_production(&self, record: &ProductionRecord) -> AppResult<ProductionRecord>;

    async fn update_delivery(&self, record: &DeliveryRecord) -> AppResult<DeliveryRecord>;
}

/// HTTP client for the farm API
#[derive(Clone)]
pub struct FarmApiClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    tenant_id: Option<String>,
}

impl FarmApiClient {
    /// Create a new FarmApiClient from configuration
    pub fn new(config: &FarmApiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            tenant_id: config.tenant_id.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        match &self.tenant_id {
            Some(tenant) => request.header(TENANT_HEADER, tenant),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> AppResult<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Farm API request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, what, "farm API request rejected");
            return Err(AppError::ExternalService(format!(
                "Farm API error: {} - {}",
                status, body
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse farm API {} response: {}", what, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, what: &str) -> AppResult<T> {
        self.send(self.client.get(self.url(path)), what).await
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, filter: &RecordFilter, what: &str) -> AppResult<T> {
        self.send(self.client.get(self.url(path)).query(filter), what)
            .await
    }
}

#[async_trait]
impl FarmDataSource for FarmApiClient {
    async fn list_productions(&self, filter: &RecordFilter) -> AppResult<Vec<ProductionRecord>> {
        self.list("/api/v1/milk-productions/", filter, "milk productions")
            .await
    }

    async fn list_deliveries(&self, filter: &RecordFilter) -> AppResult<Vec<DeliveryRecord>> {
        self.list("/api/v1/milk-deliveries/", filter, "milk deliveries")
            .await
    }

    async fn list_prices(&self, filter: &RecordFilter) -> AppResult<Vec<MilkPrice>> {
        self.list("/api/v1/milk-prices/", filter, "milk prices").await
    }

    async fn billing_defaults(&self) -> AppResult<Option<TenantBillingDefaults>> {
        match self.get("/api/v1/settings/billing", "billing settings").await {
            Ok(defaults) => Ok(Some(defaults)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_animals(&self) -> AppResult<Vec<AnimalRef>> {
        self.get("/api/v1/animals/", "animals").await
    }

    async fn get_production(&self, id: Uuid) -> AppResult<ProductionRecord> {
        self.get(&format!("/api/v1/milk-productions/{}", id), "milk production")
            .await
    }

    async fn get_delivery(&self, id: Uuid) -> AppResult<DeliveryRecord> {
        self.get(&format!("/api/v1/milk-deliveries/{}", id), "milk delivery")
            .await
    }

    async fn create_productions(&self, drafts: &[NewProduction]) -> AppResult<Vec<ProductionRecord>> {
        let request = self
            .client
            .post(self.url("/api/v1/milk-productions/bulk"))
            .json(&serde_json::json!({ "items": drafts }));
        self.send(request, "milk productions").await
    }

    async fn create_delivery(&self, draft: &NewDelivery) -> AppResult<DeliveryRecord> {
        let request = self
            .client
            .post(self.url("/api/v1/milk-deliveries/"))
            .json(draft);
        self.send(request, "milk delivery").await
    }

    async fn update_production(&self, record: &ProductionRecord) -> AppResult<ProductionRecord> {
        let request = self
            .client
            .put(self.url(&format!("/api/v1/milk-productions/{}", record.id)))
            .json(record);
        self.send(request, "milk production").await
    }

    async fn update_delivery(&self, record: &DeliveryRecord) -> AppResult<DeliveryRecord> {
        let request = self
            .client
            .put(self.url(&format!("/api/v1/milk-deliveries/{}", record.id)))
            .json(record);
        self.send(request, "milk delivery").await
    }
}
