use pinpoint_core::{Config, Paths};
use std::time::Duration;

use super::serve::build_driver;

/// Open `url`, let the operator pick and annotate one element, print the
/// record as JSON on stdout.
pub async fn run(url: &str, timeout_secs: u64) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    config.validate()?;
    let driver = build_driver(paths, config);
    let mut driver = driver.lock().await;

    driver.launch_session(Some(url)).await?;
    driver.inject_engine().await?;
    eprintln!();
    eprintln!("🎯 Click \"Inspect\" in the page, pick an element, click it again and describe the change.");
    eprintln!("   Waiting up to {}s…", timeout_secs);

    let result = driver
        .wait_for_selection(Duration::from_secs(timeout_secs))
        .await;
    driver.close_session().await;

    let record = result?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
