use pinpoint_core::{Config, Paths};
use pinpoint_tools::browser::{find_browser_binary, BrowserEngine};
use pinpoint_tools::ToolRegistry;

/// Run environment diagnostics.
pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!();
    println!("🩺 pinpoint doctor — Environment Diagnostics");
    println!("================================");
    println!();

    let mut ok_count = 0u32;
    let mut warn_count = 0u32;
    let mut err_count = 0u32;

    // --- 1. Config ---
    println!("📋 Configuration");
    if paths.config_file().exists() {
        print_ok("Config file exists", &paths.config_file().display().to_string());
        ok_count += 1;
    } else {
        print_warn("Config file not found", "Defaults in use; `pinpoint config init` writes one");
        warn_count += 1;
    }

    let config = match Config::load_or_default(&paths) {
        Ok(config) => config,
        Err(e) => {
            print_err("Config file unreadable", &e.to_string());
            err_count += 1;
            Config::default()
        }
    };
    match config.validate() {
        Ok(()) => {
            print_ok("Config valid", "");
            ok_count += 1;
        }
        Err(e) => {
            print_err("Config invalid", &e.to_string());
            err_count += 1;
        }
    }
    println!();

    // --- 2. Browser ---
    println!("🌐 Browser");
    match BrowserEngine::parse(&config.browser.engine) {
        Ok(engine) => match find_browser_binary(engine, config.browser.binary.as_deref()) {
            Some(path) => {
                print_ok(&format!("{} found", engine.name()), &path);
                ok_count += 1;
            }
            None => {
                print_err(
                    &format!("{} not found", engine.name()),
                    "Install it or set browser.binary in the config",
                );
                err_count += 1;
            }
        },
        Err(e) => {
            print_err("Unsupported browser engine", &e.to_string());
            err_count += 1;
        }
    }
    println!(
        "  Mode: {}, window {}×{}",
        if config.browser.headed { "headed" } else { "headless" },
        config.browser.window_width,
        config.browser.window_height
    );
    println!();

    // --- 3. Profiles ---
    println!("📁 Browser profiles");
    let dir = paths.browser_dir();
    let probe = dir.join(".doctor_test");
    match std::fs::create_dir_all(&dir).and_then(|_| std::fs::write(&probe, "test")) {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            print_ok("Profile directory writable", &dir.display().to_string());
            ok_count += 1;
        }
        Err(e) => {
            print_err("Profile directory not writable", &e.to_string());
            err_count += 1;
        }
    }
    println!();

    // --- 4. Tools ---
    println!("🔧 Tools");
    print_ok(
        "Registered",
        &format!("{} tools", ToolRegistry::with_defaults().tool_names().len()),
    );
    ok_count += 1;
    println!();

    // --- Summary ---
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "  ✅ {} passed  ⚠️  {} warnings  ❌ {} errors",
        ok_count, warn_count, err_count
    );
    println!();
    if err_count > 0 {
        println!("  {} error(s) must be fixed before normal use.", err_count);
    } else {
        println!("  🎉 All good!");
    }
    println!();

    Ok(())
}

fn print_ok(label: &str, detail: &str) {
    if detail.is_empty() {
        println!("  ✅ {}", label);
    } else {
        println!("  ✅ {} — {}", label, detail);
    }
}

fn print_warn(label: &str, hint: &str) {
    if hint.is_empty() {
        println!("  ⚠️  {}", label);
    } else {
        println!("  ⚠️  {} — {}", label, hint);
    }
}

fn print_err(label: &str, hint: &str) {
    if hint.is_empty() {
        println!("  ❌ {}", label);
    } else {
        println!("  ❌ {} — {}", label, hint);
    }
}
