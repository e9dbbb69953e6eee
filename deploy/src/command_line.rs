use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::{
    aptos::AptosCli,
    deploy::Deploy,
    env_file::EnvMap,
    network::{Network, NetworkConfig, RECOGNIZED_KEYS},
    runner::SystemRunner,
    setup::{Setup, DEFAULT_GUIDE_PATH},
    summary::DEFAULT_SUMMARY_PATH,
};

#[derive(Debug, Parser)]
#[command(name = "deploy", about = "Build and publish the copy trading Move package on Aptos")]
pub struct CommandLine {
    /// Env file holding the network settings
    #[clap(long, global = true, env = "APTOS_ENV_FILE", default_value = ".env")]
    env_file: PathBuf,

    /// CLI profile to sign with
    #[clap(
        short,
        long,
        global = true,
        env = "APTOS_DEPLOY_PROFILE",
        default_value = "copy-trading-deploy"
    )]
    profile: String,

    /// Directory containing Move.toml
    #[clap(long, global = true, default_value = ".")]
    package_dir: PathBuf,

    /// Path or name of the aptos binary
    #[clap(long, global = true, env = "APTOS_CLI", default_value = "aptos")]
    aptos_bin: String,

    /// Overrides APTOS_NETWORK
    #[clap(short, long, global = true, value_enum)]
    network: Option<Network>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fund the account, compile, publish and write a deployment summary
    Deploy {
        #[clap(long, default_value = DEFAULT_SUMMARY_PATH)]
        summary_path: PathBuf,

        /// Run `aptos move test` before publishing
        #[clap(long)]
        run_tests: bool,
    },
    /// Check the CLI, verify the package, compile and run the tests
    Setup {
        /// Run the CLI installer if `aptos` is not found
        #[clap(long)]
        install_cli: bool,

        #[clap(long, default_value = DEFAULT_GUIDE_PATH)]
        guide_path: PathBuf,
    },
}

impl CommandLine {
    pub async fn execute(self) -> Result<()> {
        let mut env = EnvMap::load(&self.env_file)?;
        env.overlay_process_env(RECOGNIZED_KEYS);
        let network = NetworkConfig::resolve(&env, self.network);
        let cli = AptosCli::new(self.aptos_bin, self.package_dir);
        let runner = SystemRunner;

        match self.command {
            Command::Deploy {
                summary_path,
                run_tests,
            } => {
                Deploy::new(&runner, cli, network)
                    .run(&self.profile, &summary_path, run_tests)
                    .await?;
            }
            Command::Setup {
                install_cli,
                guide_path,
            } => Setup::new(&runner, cli).run(install_cli, &guide_path).await?,
        }
        Ok(())
    }
}
