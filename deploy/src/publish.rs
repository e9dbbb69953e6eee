//! Extraction of results from `aptos move publish` output.
//!
//! The CLI is only reachable through its printed output, so everything the
//! workflow learns about a publish goes through [`PublishOutput::parse`].

use serde::Deserialize;

use crate::aptos::CliResponse;

pub const TRANSACTION_HASH_MARKER: &str = "Transaction hash:";
pub const RESOURCE_ACCOUNT_MARKER: &str = "Deployed to resource account:";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOutput {
    pub transaction_hash: Option<String>,
    pub resource_account: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionResult {
    transaction_hash: Option<String>,
}

impl PublishOutput {
    /// Missing markers leave the field `None`; this never fails.
    pub fn parse(output: &str) -> Self {
        let mut parsed = Self::default();

        if let Ok(CliResponse::Result(result)) =
            serde_json::from_str::<CliResponse<TransactionResult>>(output)
        {
            parsed.transaction_hash = result.transaction_hash.filter(|h| !h.is_empty());
        }

        for line in output.lines() {
            if parsed.transaction_hash.is_none() && line.contains(TRANSACTION_HASH_MARKER) {
                parsed.transaction_hash = value_after_colon(line);
            }
            if parsed.resource_account.is_none() && line.contains(RESOURCE_ACCOUNT_MARKER) {
                parsed.resource_account = value_after_colon(line);
            }
        }
        parsed
    }
}

fn value_after_colon(line: &str) -> Option<String> {
    line.split_once(':')
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
