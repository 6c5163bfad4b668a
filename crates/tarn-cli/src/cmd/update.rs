//! Update command
use super::Session;
use anyhow::{Context, Result};

/// Update a package (or every installed package); dependents follow
pub fn update(session: &mut Session, package: Option<&str>, all: bool) -> Result<()> {
    if all {
        return session
            .registry
            .update_all()
            .context("Failed to update installed packages");
    }

    let name = session.package_or_default(package);
    session
        .registry
        .update_package(&name)
        .with_context(|| format!("Failed to update {name}"))
}
