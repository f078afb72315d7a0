use serde::{ Serialize, Deserialize };

/// A hardware device bound to an agent, identified by its MAC address.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiDevice {
    pub id: String,
    pub mac_address: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub agent: String,
    #[serde(default)]
    pub board: String,
    #[serde(default)]
    pub last_connected: String,
}
