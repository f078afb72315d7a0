use std::sync::Arc;

use log::info;
use thiserror::Error;

use crate::models::device::AiDevice;
use crate::store::{ BindReceipt, RecordStore, StoreError };

/// Length of the pairing code an unbound device displays.
pub const BIND_CODE_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("bind code must be exactly 6 digits")]
    MalformedCode,
    #[error(transparent)] Store(#[from] StoreError),
}

/// Check a user-entered bind code before sending it to the hub.
pub fn validate_bind_code(code: &str) -> Result<(), BindError> {
    if code.len() == BIND_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(BindError::MalformedCode)
    }
}

/// Device binding operations over the record store.
pub struct DeviceManager {
    store: Arc<dyn RecordStore>,
}

impl DeviceManager {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Bind the device showing `code` to an agent.
    pub async fn bind(&self, code: &str, agent_id: &str) -> Result<BindReceipt, BindError> {
        validate_bind_code(code)?;
        let receipt = self.store.bind_device(code, agent_id).await?;
        info!("bound device {} to agent {}", receipt.mac_address, receipt.agent_id);
        Ok(receipt)
    }

    /// Devices bound to an agent, newest first.
    pub async fn list(&self, agent_id: &str) -> Result<Vec<AiDevice>, StoreError> {
        self.store.list_devices(agent_id).await
    }

    pub async fn unbind(&self, device_id: &str) -> Result<(), StoreError> {
        self.store.delete_device(device_id).await
    }
}
