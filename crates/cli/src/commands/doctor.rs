//! `windlass doctor`: diagnose configuration and reasoner health.

use windlass_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Windlass Doctor");
    println!("==================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    let config = if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ✅ Config file valid");
                config
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                issues += 1;
                AppConfig::default()
            }
        }
    } else {
        println!("  ⚠️  No config file, using defaults (run `windlass onboard`)");
        AppConfig::default()
    };

    println!("     Endpoint: {}", config.reasoner.base_url);
    println!("     Model:    {}", config.reasoner.model);

    // Check the reasoner is reachable
    let reasoner = windlass_providers::build_from_config(&config);
    match reasoner.health_check().await {
        Ok(()) => println!("  ✅ Reasoner reachable"),
        Err(e) => {
            println!("  ❌ Reasoner unreachable: {e}");
            issues += 1;
        }
    }

    // Check tools
    let registry = windlass_tools::default_registry(&config.tools);
    println!("  ✅ {} tool(s) registered", registry.len());

    let drop_dir = std::path::Path::new(&config.tools.drop_dir);
    if drop_dir.exists() {
        println!("  ✅ Drop directory exists: {}", drop_dir.display());
    } else {
        println!(
            "  ⚠️  Drop directory missing (created on first write): {}",
            drop_dir.display()
        );
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
