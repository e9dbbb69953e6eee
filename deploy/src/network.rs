use std::{fmt, str::FromStr};

use anyhow::{bail, Error};
use serde::Serialize;

use crate::env_file::EnvMap;

pub const APTOS_NETWORK: &str = "APTOS_NETWORK";
pub const APTOS_USE_ANKR: &str = "APTOS_USE_ANKR";
pub const APTOS_ANKR_TESTNET_RPC: &str = "APTOS_ANKR_TESTNET_RPC";
pub const APTOS_ANKR_MAINNET_RPC: &str = "APTOS_ANKR_MAINNET_RPC";
pub const APTOS_TESTNET_RPC: &str = "APTOS_TESTNET_RPC";
pub const APTOS_MAINNET_RPC: &str = "APTOS_MAINNET_RPC";
pub const APTOS_API_KEY: &str = "APTOS_API_KEY";
pub const NEXT_PUBLIC_APTOS_NETWORK: &str = "NEXT_PUBLIC_APTOS_NETWORK";
pub const NEXT_PUBLIC_APTOS_NODE_URL: &str = "NEXT_PUBLIC_APTOS_NODE_URL";

/// Keys the deployment driver reads, in the order they are documented.
pub const RECOGNIZED_KEYS: &[&str] = &[
    APTOS_NETWORK,
    APTOS_USE_ANKR,
    APTOS_ANKR_TESTNET_RPC,
    APTOS_ANKR_MAINNET_RPC,
    APTOS_TESTNET_RPC,
    APTOS_MAINNET_RPC,
    APTOS_API_KEY,
    NEXT_PUBLIC_APTOS_NETWORK,
    NEXT_PUBLIC_APTOS_NODE_URL,
];

/// Used for testnet when an API key is set but no primary endpoint is.
pub const APTOS_LABS_TESTNET_API: &str = "https://api.testnet.aptoslabs.com/v1";

/// Faucet for profiles bound to a custom testnet endpoint.
pub const APTOS_TESTNET_FAUCET: &str = "https://faucet.testnet.aptoslabs.com";

pub const ANKR_MAINNET_FALLBACK: &str = "https://rpc.ankr.com/http/aptos/v1";
pub const ANKR_TESTNET_FALLBACK: &str = "https://rpc.ankr.com/http/aptos_testnet/v1";

/// Substring identifying alternate-provider node URLs.
pub const ANKR_DOMAIN: &str = "ankr.com";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }

    /// Lenient read of `APTOS_NETWORK`: anything other than mainnet is testnet.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("mainnet") => Network::Mainnet,
            _ => Network::Testnet,
        }
    }

    pub fn ankr_key(&self) -> &'static str {
        match self {
            Network::Testnet => APTOS_ANKR_TESTNET_RPC,
            Network::Mainnet => APTOS_ANKR_MAINNET_RPC,
        }
    }

    pub fn primary_key(&self) -> &'static str {
        match self {
            Network::Testnet => APTOS_TESTNET_RPC,
            Network::Mainnet => APTOS_MAINNET_RPC,
        }
    }

    pub fn ankr_fallback(&self) -> &'static str {
        match self {
            Network::Testnet => ANKR_TESTNET_FALLBACK,
            Network::Mainnet => ANKR_MAINNET_FALLBACK,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => bail!("unknown network: {other}"),
        }
    }
}

/// Where to reach the chain for one run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network: Network,
    pub rpc_url: Option<String>,
    pub use_ankr: bool,
    pub api_key: Option<String>,
}

impl NetworkConfig {
    /// Derives the active endpoint from `env`. `network` overrides
    /// `APTOS_NETWORK` when given.
    pub fn resolve(env: &EnvMap, network: Option<Network>) -> Self {
        let network = network.unwrap_or_else(|| Network::from_env_value(env.get(APTOS_NETWORK)));
        let use_ankr = env
            .get(APTOS_USE_ANKR)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
        let api_key = env.non_empty(APTOS_API_KEY).map(str::to_string);

        let ankr = env.non_empty(network.ankr_key());
        let mut primary = env.non_empty(network.primary_key());
        if network == Network::Testnet && primary.is_none() && api_key.is_some() {
            primary = Some(APTOS_LABS_TESTNET_API);
        }

        let rpc_url = if use_ankr || primary.is_none() {
            ankr.or(primary)
        } else {
            primary.or(ankr)
        };

        Self {
            network,
            rpc_url: rpc_url.map(str::to_string),
            use_ankr,
            api_key,
        }
    }
}
