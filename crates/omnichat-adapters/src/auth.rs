//! Stored-credential loading for the Google adapters.
//!
//! OmniChat only *reads* a previously obtained OAuth bearer token —
//! config value first, then a token file. Acquiring or refreshing tokens
//! happens outside the orchestrator's scope.

use omnichat_core::adapter::AdapterError;
use omnichat_core::config::GoogleConfig;

/// Resolve the bearer token for Google API calls.
pub fn bearer_token(config: &GoogleConfig) -> Result<String, AdapterError> {
    if !config.access_token.is_empty() {
        return Ok(config.access_token.clone());
    }

    if let Some(path) = &config.token_file {
        let expanded = omnichat_core::utils::expand_home(path);
        match std::fs::read_to_string(&expanded) {
            Ok(token) => {
                let token = token.trim().to_string();
                if !token.is_empty() {
                    return Ok(token);
                }
            }
            Err(e) => {
                return Err(AdapterError::Credentials(format!(
                    "failed to read token file {}: {e}",
                    expanded.display()
                )));
            }
        }
    }

    Err(AdapterError::Credentials(
        "no Google access token configured (set google.accessToken, google.tokenFile, \
         or GOOGLE_ACCESS_TOKEN)"
            .into(),
    ))
}
