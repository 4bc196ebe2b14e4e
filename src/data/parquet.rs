//! Parquet snapshot loading for follow data

use crate::data::memory::MemoryDirectory;
use crate::directory::Profile;
use anyhow::Result;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;

/// Load a follow snapshot into an in-memory directory.
///
/// `links_path` holds Farcaster-style link rows (`Fid`, `TargetFid`,
/// `LinkType`); only `follow` links are kept. The optional `profiles_path`
/// holds `Fid`, `Username` and `DisplayName` columns.
pub fn load_follow_snapshot(
    links_path: &str,
    profiles_path: Option<&str>,
) -> Result<MemoryDirectory> {
    log::info!("Reading links parquet file: {}", links_path);

    if !Path::new(links_path).exists() {
        return Err(anyhow::anyhow!("File not found: {}", links_path));
    }
    let links = LazyFrame::scan_parquet(links_path, Default::default())?.collect()?;

    let profiles = match profiles_path {
        Some(path) => {
            log::info!("Reading profiles parquet file: {}", path);
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("File not found: {}", path));
            }
            Some(LazyFrame::scan_parquet(path, Default::default())?.collect()?)
        }
        None => None,
    };

    directory_from_frames(&links, profiles.as_ref())
}

/// Build a directory from already loaded link and profile frames
pub fn directory_from_frames(
    links: &DataFrame,
    profiles: Option<&DataFrame>,
) -> Result<MemoryDirectory> {
    let df = links
        .clone()
        .lazy()
        .filter(col("LinkType").eq(lit("follow")))
        .collect()?;

    log::info!("Loaded {} follow relationships", df.height());

    let fid_col = df.column("Fid")?.str()?;
    let target_fid_col = df.column("TargetFid")?.str()?;

    // Follow lists keep file order; follower counts are in-degrees over the snapshot
    let mut follows: HashMap<String, Vec<String>> = HashMap::new();
    let mut follower_counts: HashMap<String, u64> = HashMap::new();
    let mut account_order: Vec<String> = Vec::new();

    for i in 0..df.height() {
        let (Some(src), Some(dst)) = (fid_col.get(i), target_fid_col.get(i)) else {
            continue;
        };

        if !follows.contains_key(src) {
            account_order.push(src.to_string());
        }
        follows.entry(src.to_string()).or_default().push(dst.to_string());
        *follower_counts.entry(dst.to_string()).or_insert(0) += 1;
    }

    let mut directory = MemoryDirectory::new();

    if let Some(profiles) = profiles {
        let fid_col = profiles.column("Fid")?.str()?;
        let username_col = profiles.column("Username")?.str()?;
        let display_col = profiles.column("DisplayName")?.str()?;

        for i in 0..profiles.height() {
            let Some(fid) = fid_col.get(i) else {
                continue;
            };
            let mut profile = Profile::new(fid, username_col.get(i).unwrap_or(fid));
            profile.display_name = display_col.get(i).map(str::to_string);
            profile.follower_count = Some(follower_counts.get(fid).copied().unwrap_or(0));
            directory.add_profile(profile);
        }
        log::info!("Loaded {} profiles", profiles.height());
    }

    for src in &account_order {
        if let Some(targets) = follows.get(src) {
            directory.add_follows(src, targets);
        }
    }

    // Accounts missing from the profile table still carry their follower count
    let unprofiled: Vec<Profile> = account_order
        .iter()
        .chain(follower_counts.keys())
        .filter_map(|id| directory.profile(id))
        .filter(|profile| profile.follower_count.is_none())
        .cloned()
        .collect();
    for profile in unprofiled {
        let count = follower_counts.get(&profile.id).copied().unwrap_or(0);
        directory.add_profile(profile.with_follower_count(count));
    }

    log::info!("Snapshot directory holds {} accounts", directory.account_count());

    Ok(directory)
}
