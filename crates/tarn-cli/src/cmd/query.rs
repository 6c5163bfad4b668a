//! Query command
use super::Session;
use anyhow::{Context, Result};
use tarn_core::PackageStatus;
use tarn_schema::PackageName;

/// Report whether a package (or every package) is installed
pub fn query(session: &mut Session, package: Option<&str>, all: bool) -> Result<()> {
    let names: Vec<PackageName> = if all {
        session.registry.package_names().cloned().collect()
    } else {
        vec![session.package_or_default(package)]
    };

    let mut lines = Vec::with_capacity(names.len());
    for name in &names {
        let status = session
            .registry
            .status(name)
            .with_context(|| format!("Failed to query {name}"))?;
        lines.push(describe(&status));
    }

    session.sync();
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn describe(status: &PackageStatus) -> String {
    match (&status.install_path, status.installed) {
        (Some(path), true) => format!("{}: installed at {}", status.name, path.display()),
        (None, true) => format!("{}: installed", status.name),
        (_, false) if status.downloaded => format!("{}: downloaded, not installed", status.name),
        (_, false) => format!("{}: not installed", status.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tarn_schema::PackageKind;

    fn status(installed: bool, downloaded: bool, path: Option<&str>) -> PackageStatus {
        PackageStatus {
            name: PackageName::new("clhep"),
            kind: PackageKind::Local,
            installed,
            downloaded,
            install_path: path.map(PathBuf::from),
        }
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&status(true, true, Some("/opt/clhep"))),
            "clhep: installed at /opt/clhep"
        );
        assert_eq!(describe(&status(true, false, None)), "clhep: installed");
        assert_eq!(describe(&status(false, true, None)), "clhep: downloaded, not installed");
        assert_eq!(describe(&status(false, false, None)), "clhep: not installed");
    }
}
