use pinpoint_core::{Config, Paths};

/// Show the effective configuration as pretty-printed JSON.
pub async fn show() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;

    println!();
    println!("📋 Current Configuration");
    if paths.config_file().exists() {
        println!("  File: {}", paths.config_file().display());
    } else {
        println!("  File: {} (not created, showing defaults)", paths.config_file().display());
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub async fn init(force: bool) -> anyhow::Result<()> {
    let paths = Paths::new();
    write_default(&paths, force)?;
    Ok(())
}

pub async fn path() -> anyhow::Result<()> {
    println!("{}", Paths::new().config_file().display());
    Ok(())
}

fn write_default(paths: &Paths, force: bool) -> anyhow::Result<bool> {
    let file = paths.config_file();
    if file.exists() && !force {
        println!("⚠️  {} already exists (use --force to overwrite)", file.display());
        return Ok(false);
    }
    Config::default().save(&file)?;
    println!("✅ Wrote {}", file.display());
    Ok(true)
}
