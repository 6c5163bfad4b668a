//! Remove command
use super::Session;
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use std::fs;
use std::io::Write;

/// Remove a package, or the whole install directory with `--all`
#[allow(clippy::fn_params_excessive_bools)]
pub fn remove(session: &mut Session, package: Option<&str>, force: bool, all: bool, yes: bool) -> Result<()> {
    if all {
        return remove_everything(session, yes);
    }

    let name = session.package_or_default(package);
    session
        .registry
        .remove_package(&name, force)
        .with_context(|| format!("Failed to remove {name}"))
}

fn remove_everything(session: &mut Session, yes: bool) -> Result<()> {
    let install_dir = session.registry.system().install_path().to_path_buf();

    if !yes {
        session.sync();
        println!();
        print!(
            "  {} This will delete everything in {}. Continue? (y/N) ",
            "WARNING:".bold().red(),
            install_dir.display()
        );
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            session.info("Operation cancelled");
            return Ok(());
        }
    }

    if install_dir.exists() {
        fs::remove_dir_all(&install_dir)
            .with_context(|| format!("Failed to remove {}", install_dir.display()))?;
    }
    // Re-probe so the registry matches the empty directory.
    session.registry.check_all_installed()?;
    session.info(&format!("Removed {}", install_dir.display()));
    Ok(())
}
