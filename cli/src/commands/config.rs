use anyhow::Result;
use serde_json::json;

use crate::config::Config;

pub(crate) fn cmd_config_show(config: &Config, json: bool) -> Result<()> {
    let key = config.redacted_anon_key();

    if json {
        let mut value = serde_json::to_value(config)?;
        value["supabase_anon_key"] = json!(key);
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Backend:        {:?}", config.backend);
    println!("Database:       {}", config.db_path.display());
    println!("Session file:   {}", config.session_path.display());
    println!(
        "Config file:    {}",
        config.config_dir.join("config.json").display()
    );
    println!(
        "Supabase URL:   {}",
        config.supabase_url.as_deref().unwrap_or("-")
    );
    println!("Supabase key:   {}", key.as_deref().unwrap_or("-"));
    Ok(())
}
