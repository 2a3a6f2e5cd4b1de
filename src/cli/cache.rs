use crate::cache::{CompletionTarget, EntityCache, candidates};
use crate::config::Settings;

use super::client;
use super::pickers::confirm_action;

pub fn run_cache_warmup(settings: &Settings) -> anyhow::Result<()> {
    let client = client(settings)?;
    let mut cache = EntityCache::new(settings.cache_dir());
    cache.warmup(&client)?;

    println!(
        "[OK] Cached {} users, {} projects, {} repositories in {}",
        cache.users().len(),
        cache.projects().len(),
        cache.repositories().len(),
        cache.path().display()
    );
    Ok(())
}

pub fn run_cache_clear(settings: &Settings, yes: bool) -> anyhow::Result<()> {
    let mut cache = EntityCache::new(settings.cache_dir());
    if !confirm_action("Clear the local cache?", yes)? {
        println!("Cancelled.");
        return Ok(());
    }
    cache.clear()?;
    println!("[OK] Cache cleared");
    Ok(())
}

pub fn run_cache_dump(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let cache = EntityCache::open(settings.cache_dir());
    if json {
        println!("{}", serde_json::to_string_pretty(cache.snapshot())?);
    } else {
        print!("{cache}");
    }
    Ok(())
}

/// Prints one candidate per line. Unknown flags print nothing.
pub fn run_complete(settings: &Settings, flag: &str) -> anyhow::Result<()> {
    let Some(target) = CompletionTarget::from_flag(flag) else {
        return Ok(());
    };
    let cache = EntityCache::open(settings.cache_dir());
    for candidate in candidates(&cache, target) {
        println!("{candidate}");
    }
    Ok(())
}
