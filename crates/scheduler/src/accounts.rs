//! Discovery of the scheduler accounts the current user may charge.
//!
//! Project accounts are the user's Unix groups whose names start with `P`.

use std::time::Duration;

use crate::client::SchedulerError;
use crate::subprocess::run_checked;

/// Extract project accounts from `id` output.
///
/// ```
/// use blendfarm_scheduler::accounts::parse_group_accounts;
///
/// let out = "uid=1(me) gid=2(me) groups=2(me),5(PZS1127),6(PAS0001)";
/// assert_eq!(parse_group_accounts(out), vec!["PZS1127", "PAS0001"]);
/// ```
pub fn parse_group_accounts(id_output: &str) -> Vec<String> {
    let Some((_, groups)) = id_output.split_once("groups=") else {
        return Vec::new();
    };

    groups
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .split(',')
        .filter_map(|entry| {
            let open = entry.find('(')?;
            let close = entry.rfind(')')?;
            entry.get(open + 1..close)
        })
        .filter(|name| {
            name.starts_with('P')
                && name.len() > 1
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
        .map(str::to_string)
        .collect()
}

/// Run `id` and return the current user's project accounts.
pub async fn discover_accounts(timeout: Duration) -> Result<Vec<String>, SchedulerError> {
    let output = run_checked("id", &[], timeout).await?;
    Ok(parse_group_accounts(&output.stdout))
}
