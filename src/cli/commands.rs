use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::page::page_id::{PageIdentifier, hostname};
use crate::store::adapter::StoreAdapter;
use crate::store::relay::{Relay, RelayRequest, RelayResponse};
use crate::store::store::KeyValueStore;

type CmdResult<T> = Result<T, Box<dyn std::error::Error>>;

// ============================================================================
// init
// ============================================================================

pub async fn cmd_init<S: KeyValueStore>(store: &StoreAdapter<S>) -> CmdResult<String> {
    if store.initialize().await? {
        Ok("Store initialized".to_string())
    } else {
        Ok("Store already initialized".to_string())
    }
}

// ============================================================================
// sites subcommands
// ============================================================================

pub async fn cmd_sites_list<S: KeyValueStore>(store: &StoreAdapter<S>) -> CmdResult<String> {
    let sites = store.protected_sites().await?;
    if sites.is_empty() {
        return Ok("No sites protected yet".to_string());
    }
    Ok(sites.join("\n"))
}

pub async fn cmd_sites_add<S: KeyValueStore>(
    store: &StoreAdapter<S>,
    site: &str,
) -> CmdResult<String> {
    let host = hostname(site);
    if store.add_site(&host).await? {
        Ok(format!("Protecting {}", host))
    } else {
        Ok(format!("{} is already protected", host))
    }
}

pub async fn cmd_sites_remove<S: KeyValueStore>(
    store: &StoreAdapter<S>,
    site: &str,
) -> CmdResult<String> {
    let host = hostname(site);
    if store.remove_site(&host).await? {
        Ok(format!("No longer protecting {}", host))
    } else {
        Ok(format!("{} was not protected", host))
    }
}

pub async fn cmd_sites_toggle<S: KeyValueStore>(
    store: &StoreAdapter<S>,
    site: &str,
) -> CmdResult<String> {
    let host = hostname(site);
    let status = if store.toggle_site(&host).await? {
        "Enabled"
    } else {
        "Disabled"
    };
    Ok(format!("{}: {}", host, status))
}

// ============================================================================
// data subcommands
// ============================================================================

pub async fn cmd_data_show<S: KeyValueStore>(
    store: &StoreAdapter<S>,
    url: &str,
) -> CmdResult<String> {
    let page_id = PageIdentifier::from_url(url)?;
    let relay = Relay::new(store.clone());
    match relay.handle(RelayRequest::GetFormData { page_id }).await {
        RelayResponse::Data { data: Some(snapshot) } => Ok(serde_json::to_string_pretty(&snapshot)?),
        RelayResponse::Failed { error, .. } => Err(error.into()),
        _ => Ok("No saved data for this page".to_string()),
    }
}

pub async fn cmd_data_clear_site<S: KeyValueStore>(
    store: &StoreAdapter<S>,
    site: &str,
    confirmed: bool,
) -> CmdResult<String> {
    let host = hostname(site);
    if !confirmed {
        return Ok(format!("Not clearing saved data for {} without --yes", host));
    }
    let removed = store.clear_site_data(&host).await?;
    Ok(format!("Cleared {} saved pages for {}", removed, host))
}

pub async fn cmd_data_clear_all<S: KeyValueStore>(
    store: &StoreAdapter<S>,
    confirmed: bool,
) -> CmdResult<String> {
    if !confirmed {
        return Ok("Not clearing all sites and saved data without --yes".to_string());
    }
    store.clear_all().await?;
    Ok("Cleared all protected sites and saved form data".to_string())
}

// ============================================================================
// stats
// ============================================================================

pub async fn cmd_stats<S: KeyValueStore>(store: &StoreAdapter<S>) -> CmdResult<String> {
    let stats = store.stats().await?;
    Ok(format!(
        "Protected sites: {}\nSaved forms: {}",
        stats.sites, stats.forms
    ))
}

// ============================================================================
// relay
// ============================================================================

/// Answer one request line with one response line until `input` ends.
/// Returns the number of requests handled.
pub async fn cmd_relay<S, R, W>(store: &StoreAdapter<S>, input: R, mut output: W) -> CmdResult<usize>
where
    S: KeyValueStore,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let relay = Relay::new(store.clone());
    let mut lines = input.lines();
    let mut handled = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = relay.handle_line(&line).await;
        output.write_all(response.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
        handled += 1;
    }

    tracing::debug!(handled, "relay input closed");
    Ok(handled)
}
