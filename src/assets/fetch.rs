use super::AssetError;
use std::io::Read;
use std::path::{Path, PathBuf};

const READ_CHUNK: usize = 64 * 1024;

/// Where asset bytes come from.
#[derive(Debug, Clone)]
pub enum AssetSource {
    /// In-memory payload, e.g. a dropped or picked file.
    Bytes { name: String, bytes: Vec<u8> },
    Path(PathBuf),
    /// `http(s)://` or `file://` URL; bare strings are treated as paths.
    Url(String),
}

impl AssetSource {
    /// Classifies a command-line or config string.
    pub fn from_location(location: &str) -> Self {
        if location.contains("://") {
            AssetSource::Url(location.to_string())
        } else {
            AssetSource::Path(PathBuf::from(location))
        }
    }

    pub fn name(&self) -> String {
        match self {
            AssetSource::Bytes { name, .. } => name.clone(),
            AssetSource::Path(path) => path.display().to_string(),
            AssetSource::Url(url) => url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedBytes {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Byte-fetching capability. `progress` receives `(loaded, total)` as data arrives.
pub trait Fetch {
    fn fetch(
        &self,
        source: &AssetSource,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<FetchedBytes, AssetError>;
}

/// Reads local files and `file://` URLs, and downloads `http(s)://` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceFetcher;

impl Fetch for SourceFetcher {
    fn fetch(
        &self,
        source: &AssetSource,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<FetchedBytes, AssetError> {
        match source {
            AssetSource::Bytes { name, bytes } => {
                let total = bytes.len() as u64;
                progress(total, Some(total));
                Ok(FetchedBytes {
                    name: name.clone(),
                    bytes: bytes.clone(),
                })
            }
            AssetSource::Path(path) => read_file(path, progress),
            AssetSource::Url(url) => {
                if let Some(path) = url.strip_prefix("file://") {
                    read_file(Path::new(path), progress)
                } else if url.starts_with("http://") || url.starts_with("https://") {
                    download(url, progress)
                } else {
                    read_file(Path::new(url), progress)
                }
            }
        }
    }
}

fn read_file(
    path: &Path,
    progress: &mut dyn FnMut(u64, Option<u64>),
) -> Result<FetchedBytes, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let total = bytes.len() as u64;
    progress(total, Some(total));
    Ok(FetchedBytes {
        name: path.display().to_string(),
        bytes,
    })
}

fn download(
    url: &str,
    progress: &mut dyn FnMut(u64, Option<u64>),
) -> Result<FetchedBytes, AssetError> {
    let fetch_error = |message: String| AssetError::Fetch {
        url: url.to_string(),
        message,
    };
    let response = ureq::get(url)
        .call()
        .map_err(|err| fetch_error(err.to_string()))?;
    let total = response
        .header("Content-Length")
        .and_then(|value| value.parse::<u64>().ok());
    let mut reader = response.into_reader();
    let mut bytes = Vec::with_capacity(total.unwrap_or(0).min(256 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let read = reader
            .read(&mut chunk)
            .map_err(|err| fetch_error(err.to_string()))?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        progress(bytes.len() as u64, total);
    }
    Ok(FetchedBytes {
        name: url.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_strings_are_classified() {
        assert!(matches!(
            AssetSource::from_location("https://example.com/a.glb"),
            AssetSource::Url(_)
        ));
        assert!(matches!(
            AssetSource::from_location("models/a.glb"),
            AssetSource::Path(_)
        ));
    }

    #[test]
    fn in_memory_bytes_report_full_progress() {
        let source = AssetSource::Bytes {
            name: "a.obj".to_string(),
            bytes: vec![1, 2, 3],
        };
        let mut seen = Vec::new();
        let fetched = SourceFetcher
            .fetch(&source, &mut |loaded, total| seen.push((loaded, total)))
            .unwrap();
        assert_eq!(fetched.bytes, vec![1, 2, 3]);
        assert_eq!(seen, vec![(3, Some(3))]);
    }

    #[test]
    fn file_urls_read_from_disk() {
        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("stageview_fetch_{}_{}.bin", std::process::id(), nonce));
        std::fs::write(&path, b"abcd").unwrap();

        let url = format!("file://{}", path.display());
        let fetched = SourceFetcher
            .fetch(&AssetSource::Url(url), &mut |_, _| {})
            .unwrap();
        assert_eq!(fetched.bytes, b"abcd");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_files_surface_io_errors() {
        let result = SourceFetcher.fetch(
            &AssetSource::Path(PathBuf::from("/definitely/not/here.glb")),
            &mut |_, _| {},
        );
        assert!(matches!(result, Err(AssetError::Io { .. })));
    }
}
