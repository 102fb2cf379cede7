//! `windlass tools`: list the registered tools.

use windlass_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().unwrap_or_default();
    let registry = windlass_tools::default_registry(&config.tools);

    println!("🔧 Registered tools ({})", registry.len());
    println!();

    for definition in registry.definitions() {
        let name = definition["name"].as_str().unwrap_or("?");
        let description = definition["description"].as_str().unwrap_or("");
        println!("  {name:<14} {description}");

        if let Some(properties) = definition["parameters"]["properties"].as_object() {
            let required: Vec<&str> = definition["parameters"]["required"]
                .as_array()
                .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
                .unwrap_or_default();
            for (arg, spec) in properties {
                let marker = if required.contains(&arg.as_str()) {
                    "required"
                } else {
                    "optional"
                };
                let about = spec["description"].as_str().unwrap_or("");
                println!("    - {arg} ({marker}): {about}");
            }
        }
        println!();
    }

    Ok(())
}
