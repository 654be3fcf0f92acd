use pinpoint_core::{Config, Paths};
use pinpoint_engine::ViewportSizer;

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let sizer = ViewportSizer::new(&config.inspector);

    println!();
    println!("📱 Devices ({} total)", sizer.devices().len());
    println!();
    for device in sizer.devices() {
        let window = sizer
            .plan(device.width, device.height)
            .map(|p| format!("window {}×{}", p.window.width, p.window.height))
            .unwrap_or_default();
        println!(
            "  {:<16} {:>5} × {:<5}  {}",
            device.name, device.width, device.height, window
        );
    }
    println!();
    Ok(())
}
