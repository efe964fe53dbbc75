//! Config command handlers.

use anyhow::Result;
use jobdeck_core::config::{Config, paths};

pub fn path() -> Result<()> {
    println!("{}", paths::config_path().display());
    Ok(())
}

pub fn init() -> Result<()> {
    let created = Config::init_default()?;
    let path = paths::config_path();
    if created {
        println!("✓ Wrote default config to {}", path.display());
    } else {
        println!("Config already exists at {}", path.display());
    }
    Ok(())
}
