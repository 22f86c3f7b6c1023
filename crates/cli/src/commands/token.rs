use docket_core::config::{AppConfig, LoadOptions};
use docket_core::{AccountId, TokenAuthority};
use serde_json::json;

use crate::commands::CommandResult;

/// Issues a bearer token for `account`. Needs configuration only.
pub fn run(account: &str) -> CommandResult {
    let account = account.trim();
    if account.is_empty() {
        return CommandResult::failure("token", "invalid_argument", "account id is required", 7);
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "token",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let authority = TokenAuthority::new(config.auth.token_secret);
    match authority.issue(&AccountId(account.to_string())) {
        Ok(token) => CommandResult::success_with_data(
            "token",
            format!("issued bearer token for account {account}"),
            Some(json!({ "accountId": account, "token": token })),
        ),
        Err(error) => CommandResult::failure("token", "token_issue", error.to_string(), 7),
    }
}
