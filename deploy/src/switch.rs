use std::{fmt, path::Path};

use anyhow::Result;

use crate::{
    env_file::EnvMap,
    network::{
        Network, ANKR_DOMAIN, APTOS_NETWORK, NEXT_PUBLIC_APTOS_NETWORK, NEXT_PUBLIC_APTOS_NODE_URL,
    },
};

/// Points the three client-facing keys at `network`. The node URL comes from
/// the network's alternate-provider key, or the built-in endpoint if unset.
pub fn apply_network(env: &mut EnvMap, network: Network) {
    let node_url = env
        .non_empty(network.ankr_key())
        .unwrap_or(network.ankr_fallback())
        .to_string();
    env.set(APTOS_NETWORK, network.as_str());
    env.set(NEXT_PUBLIC_APTOS_NETWORK, network.as_str());
    env.set(NEXT_PUBLIC_APTOS_NODE_URL, node_url);
}

/// Loads `path`, switches it to `network` and rewrites the whole file.
/// There is no locking: concurrent switches race and the last write wins.
pub fn switch_network(path: &Path, network: Network) -> Result<EnvMap> {
    let mut env = EnvMap::load(path)?;
    apply_network(&mut env, network);
    env.save(path)?;
    log::info!("{} now targets {network}", path.display());
    Ok(env)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkStatus {
    pub network: String,
    pub client_network: Option<String>,
    pub node_url: Option<String>,
}

impl NetworkStatus {
    pub fn from_env(env: &EnvMap) -> Self {
        Self {
            network: env.non_empty(APTOS_NETWORK).unwrap_or("testnet").to_string(),
            client_network: env.non_empty(NEXT_PUBLIC_APTOS_NETWORK).map(str::to_string),
            node_url: env.non_empty(NEXT_PUBLIC_APTOS_NODE_URL).map(str::to_string),
        }
    }

    pub fn uses_ankr(&self) -> bool {
        self.node_url.as_deref().is_some_and(|url| url.contains(ANKR_DOMAIN))
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current network: {}", self.network)?;
        writeln!(
            f,
            "Client network: {}",
            self.client_network.as_deref().unwrap_or("Not set")
        )?;
        writeln!(f, "Current RPC: {}", self.node_url.as_deref().unwrap_or("Not set"))?;
        write!(f, "Using Ankr: {}", if self.uses_ankr() { "Yes" } else { "No" })
    }
}
