//! Deps command
use super::Session;
use anyhow::{Context, Result};

/// Install only what a package depends on
pub fn deps(session: &mut Session, package: Option<&str>) -> Result<()> {
    let name = session.package_or_default(package);
    session
        .registry
        .install_dependencies(&name)
        .with_context(|| format!("Failed to install dependencies of {name}"))?;
    session.info(&format!("Dependencies of {name} are installed"));
    Ok(())
}
