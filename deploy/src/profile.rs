use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use serde::Deserialize;

use crate::{
    aptos::{AptosCli, CliResponse},
    network::NetworkConfig,
    runner::{run_command, CommandRunner, Probe},
};

pub const DEFAULT_PROFILE: &str = "default";

/// Public fields of a CLI profile as printed by `config show-profiles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileSummary {
    #[serde(default)]
    pub has_private_key: bool,
    pub public_key: Option<String>,
    pub account: Option<String>,
    pub rest_url: Option<String>,
    pub faucet_url: Option<String>,
    pub network: Option<String>,
}

impl ProfileSummary {
    pub fn is_configured(&self) -> bool {
        self.has_private_key
            || [
                &self.public_key,
                &self.account,
                &self.rest_url,
                &self.faucet_url,
                &self.network,
            ]
            .iter()
            .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    pub fn account_address(&self) -> Option<String> {
        self.account.as_deref().and_then(normalize_address)
    }
}

fn normalize_address(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(|c: char| c == '"' || c == ',').trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(if trimmed.starts_with("0x") {
        trimmed.to_string()
    } else {
        format!("0x{trimmed}")
    })
}

/// Asks the CLI for `profile`. A profile with no configured fields counts
/// as not found.
pub async fn probe_profile<R>(runner: &R, cli: &AptosCli, profile: &str) -> Probe<ProfileSummary>
where
    R: CommandRunner + ?Sized,
{
    let output = match runner.execute(&cli.show_profile(profile)).await {
        Ok(output) => output,
        Err(e) => return Probe::Failed(e),
    };
    if !output.success {
        log::debug!("profile {profile} lookup exited non-zero: {}", output.stderr.trim());
        return Probe::NotFound;
    }

    match serde_json::from_str::<CliResponse<BTreeMap<String, ProfileSummary>>>(&output.stdout) {
        Ok(CliResponse::Result(mut profiles)) => match profiles.remove(profile) {
            Some(summary) if summary.is_configured() => Probe::Found(summary),
            _ => {
                log::info!("profile {profile} is not fully configured");
                Probe::NotFound
            }
        },
        Ok(CliResponse::Error(message)) => {
            log::debug!("profile {profile} lookup returned error: {message}");
            Probe::NotFound
        }
        Err(e) => Probe::Failed(anyhow!("unexpected show-profiles output: {e}")),
    }
}

/// Best-effort account address of `profile`. Never fails; unknown is `None`.
pub async fn resolve_account_address<R>(runner: &R, cli: &AptosCli, profile: &str) -> Option<String>
where
    R: CommandRunner + ?Sized,
{
    let output = match runner.execute(&cli.show_profile(profile)).await {
        Ok(output) if output.success => output,
        Ok(output) => {
            log::warn!("could not read profile {profile}: {}", output.stderr.trim());
            return None;
        }
        Err(e) => {
            log::warn!("could not read profile {profile}: {e:#}");
            return None;
        }
    };

    if let Ok(CliResponse::Result(mut profiles)) =
        serde_json::from_str::<CliResponse<BTreeMap<String, ProfileSummary>>>(&output.stdout)
    {
        return profiles.remove(profile).and_then(|p| p.account_address());
    }

    // Older CLIs print a plain listing.
    output
        .stdout
        .lines()
        .filter(|line| line.contains("account") && line.contains("0x"))
        .find_map(|line| line.split_once(':').and_then(|(_, value)| normalize_address(value)))
}

/// Returns the profile the rest of the run should sign with: `profile` if it
/// exists or can be created, otherwise `default` if that exists.
pub async fn ensure_profile<R>(
    runner: &R,
    cli: &AptosCli,
    profile: &str,
    network: &NetworkConfig,
) -> Result<String>
where
    R: CommandRunner + ?Sized,
{
    log::info!("setting up deployment account with profile {profile}");

    if let Some(summary) = probe_profile(runner, cli, profile).await.found("profile state") {
        log::info!(
            "profile {profile} already exists (account {})",
            summary.account_address().as_deref().unwrap_or("unknown")
        );
        return Ok(profile.to_string());
    }

    let description = match &network.rpc_url {
        Some(url) => format!("Initializing profile {profile} against {url}"),
        None => format!("Initializing profile {profile} on {}", network.network),
    };
    match run_command(runner, &cli.init_profile(profile, network), &description).await {
        Ok(_) => return Ok(profile.to_string()),
        Err(e) => log::warn!("profile creation failed: {e:#}"),
    }

    if probe_profile(runner, cli, DEFAULT_PROFILE)
        .await
        .found("default profile state")
        .is_some()
    {
        log::warn!("falling back to the {DEFAULT_PROFILE} profile");
        return Ok(DEFAULT_PROFILE.to_string());
    }

    bail!(
        "no usable profile: create one manually with `{}`",
        cli.init_hint(profile, network.network)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{network::Network, runner::testing::ScriptedRunner};

    const CONFIGURED: &str = r#"{
  "Result": {
    "deployer": {
      "has_private_key": true,
      "public_key": "0x5e1c",
      "account": "9a3f00000000000000000000000000000000000000000000000000000000c0de",
      "rest_url": "https://fullnode.testnet.aptoslabs.com",
      "faucet_url": "https://faucet.testnet.aptoslabs.com"
    }
  }
}"#;

    const DEFAULT_CONFIGURED: &str = r#"{"Result": {"default": {"has_private_key": true, "account": "0xd3fa"}}}"#;

    fn cli() -> AptosCli {
        AptosCli::new("aptos", ".")
    }

    fn testnet() -> NetworkConfig {
        NetworkConfig {
            network: Network::Testnet,
            rpc_url: None,
            use_ankr: false,
            api_key: None,
        }
    }

    #[tokio::test]
    async fn existing_profile_is_reused() {
        let runner = ScriptedRunner::new().ok("show-profiles --profile deployer", CONFIGURED);
        let active = ensure_profile(&runner, &cli(), "deployer", &testnet()).await.unwrap();
        assert_eq!(active, "deployer");
        assert!(!runner.called("aptos init"));
    }

    #[tokio::test]
    async fn empty_result_still_creates() {
        let runner = ScriptedRunner::new()
            .ok("show-profiles --profile deployer", r#"{"Result": {}}"#)
            .ok("init --profile deployer", "Aptos CLI is now set up");
        let active = ensure_profile(&runner, &cli(), "deployer", &testnet()).await.unwrap();
        assert_eq!(active, "deployer");
        assert!(runner.called("init --profile deployer --network testnet"));
    }

    #[tokio::test]
    async fn creation_targets_custom_endpoint() {
        let runner = ScriptedRunner::new()
            .fail("show-profiles", "Unable to find config")
            .ok("init --profile deployer", "");
        let network = NetworkConfig {
            rpc_url: Some("https://rpc.ankr.com/http/aptos_testnet/v1".into()),
            ..testnet()
        };
        ensure_profile(&runner, &cli(), "deployer", &network).await.unwrap();
        assert!(runner.called(
            "--network custom --rest-url https://rpc.ankr.com/http/aptos_testnet/v1"
        ));
    }

    #[tokio::test]
    async fn failed_creation_falls_back_to_default() {
        let runner = ScriptedRunner::new()
            .ok("show-profiles --profile deployer", r#"{"Result": {}}"#)
            .ok("show-profiles --profile default", DEFAULT_CONFIGURED)
            .fail("init --profile deployer", "faucet unavailable");
        let active = ensure_profile(&runner, &cli(), "deployer", &testnet()).await.unwrap();
        assert_eq!(active, DEFAULT_PROFILE);
    }

    #[tokio::test]
    async fn failed_creation_without_default_is_fatal() {
        let runner = ScriptedRunner::new()
            .ok("show-profiles", r#"{"Result": {}}"#)
            .fail("init", "network unreachable");
        let err = ensure_profile(&runner, &cli(), "deployer", &testnet())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("aptos init --profile deployer"));
    }

    #[tokio::test]
    async fn manual_setup_hint_names_configured_binary() {
        let runner = ScriptedRunner::new()
            .ok("show-profiles", r#"{"Result": {}}"#)
            .fail("init", "network unreachable");
        let cli = AptosCli::new("/usr/local/bin/aptos-4", ".");
        let err = ensure_profile(&runner, &cli, "deployer", &testnet())
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("`/usr/local/bin/aptos-4 init --profile deployer --network testnet`"));
    }

    #[tokio::test]
    async fn unparseable_output_is_a_failed_probe() {
        let runner = ScriptedRunner::new().ok("show-profiles", "not json");
        assert!(matches!(
            probe_profile(&runner, &cli(), "deployer").await,
            Probe::Failed(_)
        ));
    }

    #[tokio::test]
    async fn account_address_from_json() {
        let runner = ScriptedRunner::new().ok("show-profiles", CONFIGURED);
        assert_eq!(
            resolve_account_address(&runner, &cli(), "deployer").await.as_deref(),
            Some("0x9a3f00000000000000000000000000000000000000000000000000000000c0de")
        );
    }

    #[tokio::test]
    async fn account_address_from_plain_listing() {
        let runner = ScriptedRunner::new().ok(
            "show-profiles",
            "Profile deployer\n  account: \"0xabc123\"\n  rest_url: https://node\n",
        );
        assert_eq!(
            resolve_account_address(&runner, &cli(), "deployer").await.as_deref(),
            Some("0xabc123")
        );
    }

    #[tokio::test]
    async fn account_address_failure_is_none() {
        let runner = ScriptedRunner::new().missing("show-profiles");
        assert_eq!(resolve_account_address(&runner, &cli(), "deployer").await, None);
    }
}
