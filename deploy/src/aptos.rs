use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    network::{Network, NetworkConfig, APTOS_TESTNET_FAUCET},
    runner::Invocation,
};

pub const INSTALL_SCRIPT_URL: &str = "https://aptos.dev/scripts/install_cli.py";
pub const INSTALL_DOCS_URL: &str = "https://aptos.dev/tools/aptos-cli/install-cli/";

/// Builds every `aptos` invocation the workflows make.
#[derive(Debug, Clone)]
pub struct AptosCli {
    bin: String,
    package_dir: PathBuf,
}

impl AptosCli {
    pub fn new(bin: impl Into<String>, package_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            package_dir: package_dir.into(),
        }
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    fn command<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation::new(self.bin.clone(), args)
    }

    pub fn version(&self) -> Invocation {
        self.command(["--version"])
    }

    pub fn show_profile(&self, profile: &str) -> Invocation {
        self.command(["config", "show-profiles", "--profile", profile])
    }

    pub fn init_profile(&self, profile: &str, network: &NetworkConfig) -> Invocation {
        let mut args = vec!["init", "--profile", profile];
        match (network.rpc_url.as_deref(), network.network) {
            (Some(url), Network::Testnet) => args.extend([
                "--network",
                "custom",
                "--rest-url",
                url,
                "--faucet-url",
                APTOS_TESTNET_FAUCET,
            ]),
            (Some(url), Network::Mainnet) => {
                args.extend(["--network", "custom", "--rest-url", url, "--skip-faucet"])
            }
            (None, network) => args.extend(["--network", network.as_str()]),
        }
        args.push("--assume-yes");
        self.command(args)
    }

    pub fn fund_with_faucet(&self, profile: &str) -> Invocation {
        self.command(["account", "fund-with-faucet", "--profile", profile])
    }

    pub fn list_account(&self, profile: &str) -> Invocation {
        self.command(["account", "list", "--profile", profile])
    }

    /// Command an operator can run by hand to create `profile`.
    pub fn init_hint(&self, profile: &str, network: Network) -> String {
        format!("{} init --profile {profile} --network {network}", self.bin)
    }

    pub fn lookup_address_hint(&self, profile: &str) -> String {
        format!("{} account lookup-address --profile {profile}", self.bin)
    }

    fn move_package(&self, subcommand: &str) -> Vec<String> {
        vec![
            "move".to_string(),
            subcommand.to_string(),
            "--package-dir".to_string(),
            self.package_dir.display().to_string(),
        ]
    }

    pub fn compile(&self) -> Invocation {
        self.command(self.move_package("compile"))
    }

    pub fn test(&self) -> Invocation {
        self.command(self.move_package("test"))
    }

    pub fn publish(&self, profile: &str, network: &NetworkConfig) -> Invocation {
        let mut args = self.move_package("publish");
        args.extend(["--profile".to_string(), profile.to_string()]);
        if let Some(url) = &network.rpc_url {
            args.extend(["--url".to_string(), url.clone()]);
        }
        args.push("--assume-yes".into());
        self.command(args)
    }

    /// Platform installer for the CLI itself.
    pub fn install() -> Invocation {
        if cfg!(windows) {
            Invocation::new(
                "powershell",
                [
                    "-Command".to_string(),
                    format!(
                        "iwr \"{INSTALL_SCRIPT_URL}\" -useb | Select-Object -ExpandProperty Content | python3"
                    ),
                ],
            )
        } else {
            Invocation::new(
                "sh",
                ["-c".to_string(), format!("curl -fsSL \"{INSTALL_SCRIPT_URL}\" | python3")],
            )
        }
    }
}

/// The CLI's JSON envelope: `{"Result": ...}` or `{"Error": "..."}`.
#[derive(Debug, Deserialize)]
pub enum CliResponse<T> {
    Result(T),
    Error(String),
}
