//! List command
use super::Session;
use anyhow::Result;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use tarn_schema::PackageName;

/// List every known package with its kind and state
pub fn list(session: &mut Session) -> Result<()> {
    session.sync();

    if session.registry.is_empty() {
        println!();
        println!("  No packages known.");
        println!("  Add package manifests to the packages directory to get started.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Package", "Kind", "Status", "Location"]);

    let names: Vec<PackageName> = session.registry.package_names().cloned().collect();
    for name in &names {
        let status = session.registry.status(name)?;
        let state = if status.installed {
            Cell::new("installed").fg(Color::Green)
        } else if status.downloaded {
            Cell::new("downloaded").fg(Color::Yellow)
        } else {
            Cell::new("missing").fg(Color::DarkGrey)
        };
        let location = status
            .install_path
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(name.as_str()),
            Cell::new(status.kind.to_string()),
            state,
            Cell::new(location),
        ]);
    }

    println!("{table}");
    Ok(())
}
