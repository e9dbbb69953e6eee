use crate::network::Network;

/// Module identifiers published by the package, in dependency order.
pub const CONTRACT_MODULES: &[&str] = &[
    "copy_trading::main",
    "copy_trading::user_vault",
    "copy_trading::trader_registry",
    "copy_trading::risk_manager",
];

/// Source files the package must contain before it is worth compiling.
pub const SOURCE_FILES: &[&str] = &[
    "sources/copy_trading.move",
    "sources/user_vault.move",
    "sources/trader_registry.move",
    "sources/risk_manager.move",
];

pub const MANIFEST_FILE: &str = "Move.toml";

/// Env key the client applications read the address of `module` from, e.g.
/// `NEXT_PUBLIC_USER_VAULT_CONTRACT_ADDRESS_TESTNET`.
pub fn client_address_key(module: &str, network: Network) -> String {
    let name = match module.rsplit("::").next() {
        Some("main") | None => "copy_trading",
        Some(name) => name,
    };
    format!(
        "NEXT_PUBLIC_{}_CONTRACT_ADDRESS_{}",
        name.to_ascii_uppercase(),
        network.as_str().to_ascii_uppercase()
    )
}
