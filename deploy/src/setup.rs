use std::{fs, path::Path};

use anyhow::{bail, Context, Result};

use crate::{
    aptos::{AptosCli, INSTALL_DOCS_URL, INSTALL_SCRIPT_URL},
    contracts::{CONTRACT_MODULES, MANIFEST_FILE, SOURCE_FILES},
    deploy::probe_cli,
    runner::{run_command, CommandRunner},
};

pub const DEFAULT_GUIDE_PATH: &str = "QUICK_START.md";

/// Prepares a development checkout: CLI present, package complete and
/// compiling. Test failures only warn.
pub struct Setup<'a, R: ?Sized> {
    runner: &'a R,
    cli: AptosCli,
}

impl<'a, R> Setup<'a, R>
where
    R: CommandRunner + ?Sized,
{
    pub fn new(runner: &'a R, cli: AptosCli) -> Self {
        Self { runner, cli }
    }

    pub async fn run(&self, install_cli: bool, guide_path: &Path) -> Result<()> {
        self.ensure_cli(install_cli).await?;
        self.verify_package()?;

        run_command(self.runner, &self.cli.compile(), "Compiling Move contracts")
            .await
            .context("contract compilation failed, check the Move sources")?;

        if let Err(e) = run_command(self.runner, &self.cli.test(), "Running Move tests").await {
            log::warn!("some tests failed, review the test cases: {e:#}");
        }

        write_quick_start(guide_path)?;
        println!();
        println!("Setup completed.");
        println!("Next steps:");
        println!("  1. Run `deploy deploy` to publish the package");
        println!("  2. Update the frontend/backend with the contract addresses");
        println!("  3. Read {} for integration examples", guide_path.display());
        Ok(())
    }

    async fn ensure_cli(&self, install_cli: bool) -> Result<()> {
        if let Some(version) = probe_cli(self.runner, &self.cli).await.found("Aptos CLI") {
            log::info!("Aptos CLI found: {version}");
            return Ok(());
        }
        if !install_cli {
            bail!(
                "Aptos CLI not found. Install it from {INSTALL_DOCS_URL} or rerun with --install-cli"
            );
        }

        log::warn!("Aptos CLI not found, installing");
        if let Err(e) = run_command(self.runner, &AptosCli::install(), "Installing Aptos CLI").await {
            bail!(
                "failed to install the Aptos CLI automatically ({e:#}). Install it manually:\n  \
                 Windows: {INSTALL_DOCS_URL}\n  \
                 macOS/Linux: curl -fsSL \"{INSTALL_SCRIPT_URL}\" | python3"
            );
        }

        match probe_cli(self.runner, &self.cli).await.found("Aptos CLI") {
            Some(version) => {
                log::info!("Aptos CLI installed: {version}");
                Ok(())
            }
            None => bail!("Aptos CLI installation could not be verified"),
        }
    }

    fn verify_package(&self) -> Result<()> {
        log::info!("verifying project structure");
        let root = self.cli.package_dir();
        let missing: Vec<&str> = std::iter::once(MANIFEST_FILE)
            .chain(SOURCE_FILES.iter().copied())
            .filter(|file| !root.join(file).exists())
            .collect();

        if !missing.is_empty() {
            bail!("missing required files in {}: {}", root.display(), missing.join(", "));
        }
        log::info!("all required files found");
        Ok(())
    }
}

fn write_quick_start(path: &Path) -> Result<()> {
    let mut guide = String::from("# Quick Start\n\n## Modules\n\n");
    for module in CONTRACT_MODULES {
        guide.push_str(&format!("- `{module}`\n"));
    }
    guide.push_str(
        "
## Commands

```bash
# compile
aptos move compile --package-dir .

# test
aptos move test --package-dir .

# deploy (testnet unless APTOS_NETWORK=mainnet)
deploy deploy

# switch the application env between networks
switch-network testnet
switch-network mainnet
switch-network status
```

## After deploying

Copy the address from `deployment_summary.json` into the
`NEXT_PUBLIC_*_CONTRACT_ADDRESS_<NETWORK>` entries of the application env
files, then call entry functions as `<ADDRESS>::<module>::<function>`.

## Troubleshooting

- Keep the Aptos CLI up to date (`aptos update aptos`).
- Testnet accounts need faucet APT before publishing.
- Check the contract addresses configured in the frontend and backend match
  the deployed ones.
",
    );
    fs::write(path, guide).with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("quick start guide written to {}", path.display());
    Ok(())
}
