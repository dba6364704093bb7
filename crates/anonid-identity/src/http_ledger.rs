use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use anonid_core::Identity;

use crate::error::LedgerError;
use crate::gateway::{
    ActiveResponse, CreateRequest, CreatedResponse, KeysResponse, OwnerResponse, ReceiptResponse,
    SetAttributeRequest, TxResponse, ValueResponse,
};
use crate::ledger::{LedgerClient, Receipt, TxHandle};

/// Ledger client speaking to a REST ledger gateway.
pub struct HttpLedgerClient {
    client: Client,
    base: Url,
}

impl HttpLedgerClient {
    /// Create a client for the gateway at `endpoint`.
    pub fn new(endpoint: &str) -> Result<Self, LedgerError> {
        Self::with_client(Client::new(), endpoint)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(client: Client, endpoint: &str) -> Result<Self, LedgerError> {
        let base = Url::parse(endpoint)
            .map_err(|e| LedgerError::Transport(format!("invalid ledger endpoint {}: {}", endpoint, e)))?;
        if base.cannot_be_a_base() {
            return Err(LedgerError::Transport(format!(
                "invalid ledger endpoint {}",
                endpoint
            )));
        }
        Ok(Self { client, base })
    }

    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    fn url(&self, segments: &[&str]) -> Result<Url, LedgerError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| LedgerError::Transport(format!("invalid ledger endpoint {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, LedgerError> {
        let url = self.url(segments)?;
        tracing::trace!(url = %url, "ledger GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: Option<&B>) -> Result<T, LedgerError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        tracing::trace!(url = %url, "ledger POST");
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, LedgerError> {
    let status = response.status();
    if status.is_client_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(LedgerError::Rejected(format!("{}: {}", status, body)));
    }
    if !status.is_success() {
        return Err(LedgerError::Transport(format!("gateway returned {}", status)));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| LedgerError::Decode(e.to_string()))
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn get_owner(&self, did: &str) -> Result<Option<Identity>, LedgerError> {
        let body: OwnerResponse = self.get_json(&["api", "v1", "dids", did, "owner"]).await?;
        Ok(body.owner)
    }

    async fn is_active(&self, did: &str) -> Result<bool, LedgerError> {
        let body: ActiveResponse = self.get_json(&["api", "v1", "dids", did, "active"]).await?;
        Ok(body.active)
    }

    async fn get_attribute_keys(&self, did: &str) -> Result<Vec<String>, LedgerError> {
        let body: KeysResponse = self
            .get_json(&["api", "v1", "dids", did, "attributes"])
            .await?;
        Ok(body.keys)
    }

    async fn get_attribute(&self, did: &str, key: &str) -> Result<Option<String>, LedgerError> {
        let body: ValueResponse = self
            .get_json(&["api", "v1", "dids", did, "attributes", key])
            .await?;
        Ok(body.value)
    }

    async fn get_creation_time(&self, did: &str) -> Result<u64, LedgerError> {
        let body: CreatedResponse = self.get_json(&["api", "v1", "dids", did, "created"]).await?;
        Ok(body.created_at)
    }

    async fn create_record(&self, did: &str) -> Result<TxHandle, LedgerError> {
        let request = CreateRequest {
            did: did.to_string(),
        };
        let body: TxResponse = self
            .post_json(&["api", "v1", "dids"], Some(&request))
            .await?;
        Ok(TxHandle(body.tx_hash))
    }

    async fn set_attribute(
        &self,
        did: &str,
        key: &str,
        value: &str,
    ) -> Result<TxHandle, LedgerError> {
        let request = SetAttributeRequest {
            key: key.to_string(),
            value: value.to_string(),
        };
        let body: TxResponse = self
            .post_json(&["api", "v1", "dids", did, "attributes"], Some(&request))
            .await?;
        Ok(TxHandle(body.tx_hash))
    }

    async fn deactivate_record(&self, did: &str) -> Result<TxHandle, LedgerError> {
        let body: TxResponse = self
            .post_json::<(), _>(&["api", "v1", "dids", did, "deactivate"], None)
            .await?;
        Ok(TxHandle(body.tx_hash))
    }

    async fn confirm(&self, tx: &TxHandle) -> Result<Receipt, LedgerError> {
        let body: ReceiptResponse = self
            .get_json(&["api", "v1", "tx", tx.as_str(), "receipt"])
            .await?;
        Ok(Receipt {
            tx_hash: tx.clone(),
            success: body.success,
            block_number: body.block_number,
        })
    }
}
