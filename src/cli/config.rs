use colored::Colorize;

use penny::error::Result;
use penny::settings::{load_settings, save_settings, settings_path};

pub fn run(init: bool) -> Result<()> {
    let path = settings_path();
    let settings = load_settings();

    if init {
        save_settings(&settings)?;
        println!("Wrote settings to {}", path.display());
        return Ok(());
    }

    let status = if path.exists() {
        "".normal()
    } else {
        " (not found, using defaults)".dimmed()
    };
    println!("Settings:   {}{status}", path.display());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
