use std::path::Path;

use anyhow::{bail, Result};

use crate::{
    aptos::{AptosCli, INSTALL_SCRIPT_URL},
    contracts::{client_address_key, CONTRACT_MODULES},
    network::{Network, NetworkConfig},
    profile::ensure_profile,
    publish::PublishOutput,
    runner::{run_command, CommandRunner, Probe},
    summary::{transaction_url, write_summary, DeploymentSummary},
};

pub const TESTNET_FAUCET_URL: &str = "https://aptoslabs.com/testnet-faucet";

/// Version string of the CLI, if it can be run.
pub async fn probe_cli<R>(runner: &R, cli: &AptosCli) -> Probe<String>
where
    R: CommandRunner + ?Sized,
{
    match runner.execute(&cli.version()).await {
        Ok(output) if output.success => Probe::Found(output.stdout.trim().to_string()),
        Ok(output) => {
            log::debug!("version query failed: {}", output.stderr.trim());
            Probe::NotFound
        }
        Err(e) => Probe::Failed(e),
    }
}

/// The publish workflow against one resolved network.
pub struct Deploy<'a, R: ?Sized> {
    runner: &'a R,
    cli: AptosCli,
    network: NetworkConfig,
}

impl<'a, R> Deploy<'a, R>
where
    R: CommandRunner + ?Sized,
{
    pub fn new(runner: &'a R, cli: AptosCli, network: NetworkConfig) -> Self {
        Self {
            runner,
            cli,
            network,
        }
    }

    pub async fn run(
        &self,
        profile: &str,
        summary_path: &Path,
        run_tests: bool,
    ) -> Result<DeploymentSummary> {
        log::info!(
            "deploying to {} via {}",
            self.network.network,
            self.network.rpc_url.as_deref().unwrap_or("the CLI default endpoint")
        );

        self.check_prerequisites().await?;
        let profile = ensure_profile(self.runner, &self.cli, profile, &self.network).await?;
        self.fund_account(&profile).await;
        self.compile().await?;
        if run_tests {
            self.test().await?;
        } else {
            log::info!("skipping Move tests; run `{}` before deploying", self.cli.test());
        }
        let publish = self.publish(&profile).await?;

        let summary = write_summary(
            self.runner,
            &self.cli,
            self.network.network,
            &profile,
            &publish,
            summary_path,
        )
        .await?;
        print_next_steps(&self.cli, &summary);
        Ok(summary)
    }

    async fn check_prerequisites(&self) -> Result<()> {
        match probe_cli(self.runner, &self.cli).await.found("Aptos CLI") {
            Some(version) => {
                log::info!("Aptos CLI found: {version}");
                Ok(())
            }
            None => bail!(
                "Aptos CLI not found. Install it with: curl -fsSL \"{INSTALL_SCRIPT_URL}\" | python3"
            ),
        }
    }

    /// Never aborts the run.
    async fn fund_account(&self, profile: &str) {
        match self.network.network {
            Network::Testnet => {
                let funded = run_command(
                    self.runner,
                    &self.cli.fund_with_faucet(profile),
                    "Funding account with testnet APT",
                )
                .await;
                if let Err(e) = funded {
                    log::warn!("faucet funding failed, continuing: {e:#}");
                    println!("Fund the account manually:");
                    println!("  1. Look up the address: {}", self.cli.lookup_address_hint(profile));
                    println!("  2. Request testnet APT at {TESTNET_FAUCET_URL}");
                }
            }
            Network::Mainnet => {
                println!(
                    "Mainnet accounts are not funded automatically. Make sure profile {profile} holds enough APT for gas."
                );
            }
        }

        if let Err(e) = run_command(
            self.runner,
            &self.cli.list_account(profile),
            "Checking account balance",
        )
        .await
        {
            log::warn!("balance check failed: {e:#}");
        }
    }

    async fn compile(&self) -> Result<()> {
        run_command(self.runner, &self.cli.compile(), "Compiling Move contracts").await?;
        Ok(())
    }

    async fn test(&self) -> Result<()> {
        run_command(self.runner, &self.cli.test(), "Running Move contract tests").await?;
        Ok(())
    }

    async fn publish(&self, profile: &str) -> Result<PublishOutput> {
        let description = format!("Publishing contracts to {}", self.network.network);
        let output = run_command(
            self.runner,
            &self.cli.publish(profile, &self.network),
            &description,
        )
        .await?;

        let publish = PublishOutput::parse(&output);
        match &publish.transaction_hash {
            Some(hash) => {
                log::info!("transaction hash: {hash}");
                println!(
                    "View on Aptos Explorer: {}",
                    transaction_url(hash, self.network.network)
                );
            }
            None => log::warn!("no transaction hash found in publish output"),
        }
        if let Some(account) = &publish.resource_account {
            log::info!("deployed to resource account {account}");
        }
        Ok(publish)
    }
}

fn print_next_steps(cli: &AptosCli, summary: &DeploymentSummary) {
    println!();
    println!("Deployment completed.");
    println!("Next steps:");
    println!("  1. Update the frontend/backend with the new contract address");
    println!("  2. Check the deployment on the Aptos Explorer");
    match &summary.contract_address {
        Some(address) => {
            println!("  3. Add these lines to the application .env files:");
            for module in CONTRACT_MODULES {
                println!("     {}={address}", client_address_key(module, summary.network));
            }
        }
        None => println!(
            "  3. Contract address unknown; look it up with `{}`",
            cli.lookup_address_hint(&summary.profile)
        ),
    }
}
