//! Archive extraction module
//!
//! Handles tar.gz and plain tar source archives.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("Archive error: {0}")]
    Archive(String),
}

/// Source archive formats tarn can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Tar,
}

/// Detect the archive format from the file name, case-insensitively.
pub fn detect_format(path: &Path) -> Option<ArchiveFormat> {
    let name = path.file_name()?.to_string_lossy().to_lowercase();
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveFormat::TarGz)
    } else if name.ends_with(".tar") {
        Some(ArchiveFormat::Tar)
    } else {
        None
    }
}

/// Extract a tar.gz archive to a destination directory
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractError> {
    let file = File::open(archive_path)?;
    let gz_decoder = flate2::read::GzDecoder::new(BufReader::new(file));
    extract_tar(gz_decoder, dest_dir)
}

/// Extract a tar archive from a reader, returning the number of files written.
fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<usize, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    let mut count = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let relative_path: PathBuf = entry.path()?.into_owned();

        // Reject absolute paths and parent traversal
        if relative_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ExtractError::Archive(format!(
                "Invalid path in archive: {}",
                relative_path.display()
            )));
        }

        let absolute_path = dest_dir.join(&relative_path);
        if entry.header().entry_type().is_dir() {
            fs::create_dir_all(&absolute_path)?;
            continue;
        }
        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&absolute_path)?;
        count += 1;
    }

    Ok(count)
}

/// Extract an archive, auto-detecting format
pub fn extract_auto(archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractError> {
    match detect_format(archive_path) {
        Some(ArchiveFormat::TarGz) => extract_tar_gz(archive_path, dest_dir),
        Some(ArchiveFormat::Tar) => {
            let file = File::open(archive_path)?;
            extract_tar(BufReader::new(file), dest_dir)
        }
        None => Err(ExtractError::UnsupportedFormat(
            archive_path.display().to_string(),
        )),
    }
}

/// Detect if a directory has a single top-level directory and strip it by moving contents up.
pub fn strip_components(dir: &Path) -> io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();

    // Filter out hidden files (like .DS_Store)
    entries.retain(|e| !e.file_name().to_string_lossy().starts_with('.'));

    if entries.len() == 1 && entries[0].file_type()?.is_dir() {
        let top_level = entries[0].path();
        let sub_entries: Vec<_> = fs::read_dir(&top_level)?.filter_map(|e| e.ok()).collect();

        for entry in sub_entries {
            let target = dir.join(entry.file_name());
            fs::rename(entry.path(), target)?;
        }

        fs::remove_dir(top_level)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_tar_gz(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(Path::new("root_v5.34.tar.gz")),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(detect_format(Path::new("clhep.TGZ")), Some(ArchiveFormat::TarGz));
        assert_eq!(detect_format(Path::new("archive.tar")), Some(ArchiveFormat::Tar));
        assert_eq!(detect_format(Path::new("readme.txt")), None);
    }

    #[test]
    fn test_extract_and_strip() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("pkg.tar.gz");
        write_tar_gz(
            &archive,
            &[
                ("pkg-1.0/configure", b"#!/bin/sh\n"),
                ("pkg-1.0/src/main.c", b"int main(void) { return 0; }\n"),
            ],
        );

        let dest = dir.path().join("out");
        assert_eq!(extract_auto(&archive, &dest).unwrap(), 2);
        strip_components(&dest).unwrap();

        assert!(dest.join("configure").is_file());
        assert!(dest.join("src/main.c").is_file());
        assert!(!dest.join("pkg-1.0").exists());
    }

    #[test]
    fn test_strip_keeps_flat_layout() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), b"a").unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();

        strip_components(dir.path()).unwrap();
        assert!(dir.path().join("a").is_file());
        assert!(dir.path().join("b").is_dir());
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("source.zip");
        fs::write(&path, b"PK").unwrap();
        assert!(matches!(
            extract_auto(&path, &dir.path().join("out")),
            Err(ExtractError::UnsupportedFormat(_))
        ));
    }
}
