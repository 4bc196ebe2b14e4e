//! Rendering of ranking results

use crate::ranking::RankedAccount;
use anyhow::Result;
use serde_json::{json, to_string_pretty};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One `handle : followers count` line per account
    Text,
    /// Pretty-printed JSON array
    Json,
}

/// Write the ranked accounts to `out`
pub fn write_ranking<W: Write>(
    ranked: &[RankedAccount],
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(ranked, out),
        OutputFormat::Json => write_json(ranked, out),
    }
}

fn write_text<W: Write>(ranked: &[RankedAccount], out: &mut W) -> Result<()> {
    writeln!(out, "handle : followers count")?;
    for account in ranked {
        let followers = account
            .profile
            .follower_count
            .map_or_else(|| "-".to_string(), |count| count.to_string());
        writeln!(out, "{} : {}", account.profile.handle, followers)?;
    }
    Ok(())
}

fn write_json<W: Write>(ranked: &[RankedAccount], out: &mut W) -> Result<()> {
    let accounts = json!(ranked
        .iter()
        .enumerate()
        .map(|(i, account)| {
            json!({
                "rank": i + 1,
                "id": account.profile.id,
                "handle": account.profile.handle,
                "display_name": account.profile.display_name,
                "follower_count": account.profile.follower_count,
                "score": account.score,
            })
        })
        .collect::<Vec<_>>());

    writeln!(out, "{}", to_string_pretty(&accounts)?)?;
    Ok(())
}
