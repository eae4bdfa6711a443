use anyhow::{Context, Result};
use newsjob_infrastructure::ConfigService;

pub fn show(service: &ConfigService) -> Result<()> {
    let config = service
        .load()
        .with_context(|| format!("Failed to load {}", service.path().display()))?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render config as TOML")?;
    println!("# {}", service.path().display());
    print!("{rendered}");
    Ok(())
}

pub fn init(service: &ConfigService) -> Result<()> {
    let written = service
        .init()
        .with_context(|| format!("Failed to write {}", service.path().display()))?;
    if written {
        println!("✅ Wrote default config to {}", service.path().display());
    } else {
        println!("Config already exists at {}", service.path().display());
    }
    Ok(())
}

pub fn path(service: &ConfigService) {
    println!("{}", service.path().display());
}
