use super::CommandContext;
use anyhow::{Context, Result};
use routeguard_core::{CoreError, PermissionSummary};
use serde::Serialize;
use std::collections::BTreeSet;

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to render output")
}

/// Attach the offending keys to a rejected selection
fn describe(err: CoreError) -> anyhow::Error {
    match err {
        CoreError::InvalidRoute { keys } => anyhow::anyhow!("Rejected selection, not grantable routes: {}", keys.join(", ")),
        other => other.into(),
    }
}

pub async fn show_catalog(ctx: &CommandContext) -> Result<String> {
    let groups = ctx.engine.list_catalog().await?;
    to_json(&groups)
}

pub async fn show_tree(ctx: &CommandContext, role: &str) -> Result<String> {
    let tree = ctx.engine.build_tree(Some(role)).await?;
    to_json(&tree)
}

pub async fn grant(ctx: &CommandContext, role: &str, keys: Vec<String>) -> Result<String> {
    let target: BTreeSet<String> = keys.into_iter().collect();
    let result = ctx.engine.commit_selection(role, target).await.map_err(describe)?;
    to_json(&result.grant_set)
}

pub async fn revoke_all(ctx: &CommandContext, role: &str) -> Result<String> {
    let result = ctx.engine.revoke_all(role).await?;
    Ok(format!("Revoked {} grant(s) from role {}", result.removed.len(), role))
}

pub async fn show_summary(ctx: &CommandContext) -> Result<String> {
    let summaries = ctx.engine.summarize().await?;
    Ok(render_summary(&summaries))
}

fn render_summary(summaries: &[PermissionSummary]) -> String {
    if summaries.is_empty() {
        return "No roles defined.".to_string();
    }

    let mut out = format!("{:<20} {:<24} {:>8} {:>8}  {:<20}\n", "Role ID", "Name", "Allowed", "Total", "Last Updated");
    out.push_str(&"-".repeat(84));
    for summary in summaries {
        let last_updated = summary.last_updated.map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string()).unwrap_or_else(|| "never".to_string());
        out.push_str(&format!(
            "\n{:<20} {:<24} {:>8} {:>8}  {:<20}",
            summary.role_id, summary.role_name, summary.allowed_routes, summary.total_routes, last_updated
        ));
    }
    out
}
