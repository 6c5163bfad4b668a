//! Blocking download and verification module.
//!
//! Streams the response body to a temporary file next to the destination
//! while hashing it, and only moves it into place once the SHA256 checks out.

use std::io::{self, Write};
use std::path::Path;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::package::Credentials;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}

/// Request for a download operation
pub struct DownloadRequest<'a> {
    pub client: &'a Client,
    pub url: &'a str,
    pub dest: &'a Path,
    pub expected_hash: Option<&'a str>,
    pub credentials: Option<&'a Credentials>,
}

impl<'a> DownloadRequest<'a> {
    pub fn new(client: &'a Client, url: &'a str, dest: &'a Path) -> Self {
        Self {
            client,
            url,
            dest,
            expected_hash: None,
            credentials: None,
        }
    }

    pub fn with_hash(mut self, expected_hash: Option<&'a str>) -> Self {
        self.expected_hash = expected_hash;
        self
    }

    pub fn with_credentials(mut self, credentials: Option<&'a Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Execute the download, returning the SHA256 of what was written.
    pub fn execute(self) -> Result<String, DownloadError> {
        let mut request = self
            .client
            .get(self.url)
            .header(USER_AGENT, crate::USER_AGENT);
        if let Some(credentials) = self.credentials {
            if let Some(token) = &credentials.token {
                request = request.header(AUTHORIZATION, format!("token {token}"));
            } else if let Some(username) = &credentials.username {
                request = request.basic_auth(username, None::<&str>);
            }
        }

        let mut response = request.send()?.error_for_status()?;

        let dir = match self.dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut writer = HashingWriter::new(NamedTempFile::new_in(dir)?);
        let bytes = io::copy(&mut response, &mut writer)?;
        let (mut file, hasher) = writer.into_parts();
        file.flush()?;
        let actual_hash = hex::encode(hasher.finalize());
        tracing::debug!(url = self.url, bytes, sha256 = %actual_hash, "download finished");

        if let Some(expected) = self.expected_hash {
            if !actual_hash.eq_ignore_ascii_case(expected) {
                // Dropping the temp file deletes it.
                return Err(DownloadError::HashMismatch {
                    expected: expected.to_string(),
                    actual: actual_hash,
                });
            }
        }

        file.persist(self.dest).map_err(|e| e.error)?;
        Ok(actual_hash)
    }
}

/// Writer that feeds everything it writes into a SHA256 hasher.
struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn into_parts(self) -> (W, Sha256) {
        (self.inner, self.hasher)
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    const BODY: &[u8] = b"hello tarn";

    /// Serve a single HTTP response and hand back the request head.
    fn serve_once(body: &'static [u8]) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/src/hello.tar.gz", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                head.push_str(&line);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
            tx.send(head).unwrap();
        });
        (url, rx)
    }

    fn sha256(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    #[test]
    fn test_hashing_writer() {
        let mut writer = HashingWriter::new(Vec::new());
        writer.write_all(BODY).unwrap();
        let (inner, hasher) = writer.into_parts();
        assert_eq!(inner, BODY);
        assert_eq!(hex::encode(hasher.finalize()), sha256(BODY));
    }

    #[test]
    fn test_download_verifies_and_persists() {
        let (url, rx) = serve_once(BODY);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("hello.tar.gz");
        let client = Client::builder().no_proxy().build().unwrap();
        let expected = sha256(BODY);
        let credentials = Credentials {
            username: None,
            token: Some("s3cret".to_string()),
        };

        let hash = DownloadRequest::new(&client, &url, &dest)
            .with_hash(Some(&expected))
            .with_credentials(Some(&credentials))
            .execute()
            .unwrap();

        assert_eq!(hash, expected);
        let mut written = Vec::new();
        std::fs::File::open(&dest)
            .unwrap()
            .read_to_end(&mut written)
            .unwrap();
        assert_eq!(written, BODY);
        let head = rx.recv().unwrap().to_lowercase();
        assert!(head.contains("authorization: token s3cret"));
    }

    #[test]
    fn test_hash_mismatch_leaves_nothing_behind() {
        let (url, _rx) = serve_once(BODY);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("hello.tar.gz");
        let client = Client::builder().no_proxy().build().unwrap();
        let wrong = "0".repeat(64);

        let err = DownloadRequest::new(&client, &url, &dest)
            .with_hash(Some(&wrong))
            .execute()
            .unwrap_err();

        assert!(matches!(err, DownloadError::HashMismatch { .. }));
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
