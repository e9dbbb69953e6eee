use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    aptos::AptosCli,
    contracts::CONTRACT_MODULES,
    network::Network,
    profile::resolve_account_address,
    publish::PublishOutput,
    runner::CommandRunner,
};

pub const DEFAULT_SUMMARY_PATH: &str = "deployment_summary.json";

const EXPLORER_URL: &str = "https://explorer.aptoslabs.com";

pub fn transaction_url(hash: &str, network: Network) -> String {
    format!("{EXPLORER_URL}/txn/{hash}?network={network}")
}

pub fn account_url(address: &str, network: Network) -> String {
    format!("{EXPLORER_URL}/account/{address}?network={network}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplorerLinks {
    /// Transaction page, or the network landing page when no hash is known.
    pub transaction: String,
    pub account: Option<String>,
}

/// Record of one deployment run, rewritten on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentSummary {
    pub deployment_time: String,
    pub network: Network,
    pub profile: String,
    pub contract_address: Option<String>,
    pub transaction_hash: Option<String>,
    pub contracts: Vec<String>,
    pub explorer_links: ExplorerLinks,
}

impl DeploymentSummary {
    /// A resource account named by the publish output takes precedence over
    /// the profile's own account.
    pub fn new(
        time: DateTime<Utc>,
        network: Network,
        profile: &str,
        publish: &PublishOutput,
        account_address: Option<String>,
    ) -> Self {
        let contract_address = publish.resource_account.clone().or(account_address);
        let transaction = match &publish.transaction_hash {
            Some(hash) => transaction_url(hash, network),
            None => format!("{EXPLORER_URL}/?network={network}"),
        };
        Self {
            deployment_time: time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            network,
            profile: profile.to_string(),
            contract_address: contract_address.clone(),
            transaction_hash: publish.transaction_hash.clone(),
            contracts: CONTRACT_MODULES.iter().map(|m| m.to_string()).collect(),
            explorer_links: ExplorerLinks {
                transaction,
                account: contract_address.map(|a| account_url(&a, network)),
            },
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")
            .with_context(|| format!("failed to write deployment summary to {}", path.display()))
    }
}

/// Resolves the profile's address, builds the summary and overwrites `path`.
pub async fn write_summary<R>(
    runner: &R,
    cli: &AptosCli,
    network: Network,
    profile: &str,
    publish: &PublishOutput,
    path: &Path,
) -> Result<DeploymentSummary>
where
    R: CommandRunner + ?Sized,
{
    let account_address = resolve_account_address(runner, cli, profile).await;
    let summary = DeploymentSummary::new(Utc::now(), network, profile, publish, account_address);
    summary.write(path)?;
    log::info!("deployment summary saved to {}", path.display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::{json, Value};

    use super::*;
    use crate::runner::testing::ScriptedRunner;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn serializes_expected_shape() {
        let publish = PublishOutput {
            transaction_hash: Some("0xfeed".into()),
            resource_account: None,
        };
        let summary = DeploymentSummary::new(
            fixed_time(),
            Network::Testnet,
            "deployer",
            &publish,
            Some("0xacc".into()),
        );
        let value: Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            json!({
                "deployment_time": "2026-03-14 09:26:53 UTC",
                "network": "testnet",
                "profile": "deployer",
                "contract_address": "0xacc",
                "transaction_hash": "0xfeed",
                "contracts": [
                    "copy_trading::main",
                    "copy_trading::user_vault",
                    "copy_trading::trader_registry",
                    "copy_trading::risk_manager"
                ],
                "explorer_links": {
                    "transaction": "https://explorer.aptoslabs.com/txn/0xfeed?network=testnet",
                    "account": "https://explorer.aptoslabs.com/account/0xacc?network=testnet"
                }
            })
        );
    }

    #[test]
    fn resource_account_wins_over_profile_account() {
        let publish = PublishOutput {
            transaction_hash: None,
            resource_account: Some("0xres".into()),
        };
        let summary = DeploymentSummary::new(
            fixed_time(),
            Network::Mainnet,
            "deployer",
            &publish,
            Some("0xacc".into()),
        );
        assert_eq!(summary.contract_address.as_deref(), Some("0xres"));
    }

    #[tokio::test]
    async fn missing_hash_and_address_still_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SUMMARY_PATH);
        fs::write(&path, "stale").unwrap();

        let runner = ScriptedRunner::new().fail("show-profiles", "config not found");
        let cli = AptosCli::new("aptos", ".");
        let summary = write_summary(
            &runner,
            &cli,
            Network::Testnet,
            "deployer",
            &PublishOutput::default(),
            &path,
        )
        .await
        .unwrap();
        assert_eq!(summary.transaction_hash, None);

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["transaction_hash"], Value::Null);
        assert_eq!(written["contract_address"], Value::Null);
        assert_eq!(written["explorer_links"]["account"], Value::Null);
        assert_eq!(
            written["explorer_links"]["transaction"],
            "https://explorer.aptoslabs.com/?network=testnet"
        );
    }
}
