//! Install command
use super::Session;
use anyhow::{Context, Result};

/// Install a package (or every package) with its dependencies
pub fn install(session: &mut Session, package: Option<&str>, all: bool) -> Result<()> {
    if all {
        return session
            .registry
            .install_all()
            .context("Failed to install all packages");
    }

    let name = session.package_or_default(package);
    let path = session
        .registry
        .install_package(&name)
        .with_context(|| format!("Failed to install {name}"))?;
    match path {
        Some(path) => session.info(&format!("{name} is installed at {}", path.display())),
        None => session.info(&format!("{name} is installed")),
    }
    Ok(())
}
