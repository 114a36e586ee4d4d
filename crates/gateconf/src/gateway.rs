//! Public gateway links returned alongside each upload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Link name to URL prefix. The content id is appended to the prefix.
pub type PublicGateways = BTreeMap<String, String>;

pub fn default_public_gateways() -> PublicGateways {
    let mut gateways = BTreeMap::new();
    gateways.insert("ipfs_io".to_string(), "https://ipfs.io/ipfs/".to_string());
    gateways.insert(
        "pinata".to_string(),
        "https://gateway.pinata.cloud/ipfs/".to_string(),
    );
    gateways.insert(
        "cloudflare".to_string(),
        "https://cloudflare-ipfs.com/ipfs/".to_string(),
    );
    gateways
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_public_gateways")]
    pub public_gateways: PublicGateways,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            public_gateways: default_public_gateways(),
        }
    }
}

impl GatewayConfig {
    /// Full public URLs for `cid`, keyed by link name.
    pub fn links_for(&self, cid: &str) -> BTreeMap<String, String> {
        self.public_gateways
            .iter()
            .map(|(name, prefix)| (name.clone(), format!("{}{}", prefix, cid)))
            .collect()
    }
}
