//! Input file reader with automatic decompression.
//!
//! User lists exported from other systems are often shipped compressed.
//! `.gz` and `.zst` inputs are decompressed on the fly; anything else is
//! read as plain text.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Opens a file, decompressing by extension (`.gz`, `.zst`).
pub fn open_file(path: impl AsRef<Path>) -> Result<Box<dyn Read + Send>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "gz" => Ok(Box::new(GzDecoder::new(file))),
        "zst" => {
            let decoder = zstd::Decoder::new(file).with_context(|| {
                format!("Failed to create zstd decoder for: {}", path.display())
            })?;
            Ok(Box::new(decoder))
        }
        _ => Ok(Box::new(file)),
    }
}

/// Buffered line reader over [`open_file`].
pub fn open_lines(path: impl AsRef<Path>) -> Result<BufReader<Box<dyn Read + Send>>> {
    Ok(BufReader::new(open_file(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, Write};
    use tempfile::NamedTempFile;

    const USERS: &str = "{\"username\":\"alice\"}\n{\"username\":\"bob\"}\n";

    fn read_lines(path: &Path) -> Vec<String> {
        open_lines(path)
            .unwrap()
            .lines()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_plain_file() {
        let mut temp = NamedTempFile::with_suffix(".jsonl").unwrap();
        temp.write_all(USERS.as_bytes()).unwrap();
        temp.flush().unwrap();

        let lines = read_lines(temp.path());
        assert_eq!(lines, vec![r#"{"username":"alice"}"#, r#"{"username":"bob"}"#]);
    }

    #[test]
    fn test_gzip_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut temp = NamedTempFile::with_suffix(".jsonl.gz").unwrap();
        {
            let mut encoder = GzEncoder::new(&mut temp, Compression::default());
            encoder.write_all(USERS.as_bytes()).unwrap();
            encoder.finish().unwrap();
        }
        temp.flush().unwrap();

        assert_eq!(read_lines(temp.path()).len(), 2);
    }

    #[test]
    fn test_zstd_file() {
        let mut temp = NamedTempFile::with_suffix(".csv.zst").unwrap();
        {
            let mut encoder = zstd::Encoder::new(&mut temp, 3).unwrap();
            writeln!(encoder, "alice,secret").unwrap();
            encoder.finish().unwrap();
        }
        temp.flush().unwrap();

        assert_eq!(read_lines(temp.path()), vec!["alice,secret"]);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = open_file("/nonexistent/users.jsonl").err().unwrap();
        assert!(err.to_string().contains("/nonexistent/users.jsonl"));
    }
}
