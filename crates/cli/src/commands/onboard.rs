//! `windlass onboard`: first-time setup.

use windlass_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("⚓ Windlass: First-Time Setup");
    println!("=============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("⚠️  Config already exists: {}", config_path.display());
        println!("   Edit it directly, or delete it and re-run onboard.");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created {}", config_path.display());
        println!();
        println!("  Next steps:");
        println!("  1. Point reasoner.base_url at an OpenAI-compatible server");
        println!("  2. Check the setup:   windlass doctor");
        println!("  3. Ask something:     windlass ask \"How do I register for VAT?\"");
    }

    Ok(())
}
