//! Reading hash columns from delimited text and writing the aligned results.

use crate::config::OutputFormat;
use crate::error::{FinderError, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Where the hashes live inside the input file.
#[derive(Debug, Clone, Copy)]
pub enum HashSource<'a> {
    /// One hash per non-blank line.
    Lines,
    /// Delimited file whose first line is a header row.
    Column { name: &'a str, delimiter: char },
}

/// One output row: the input hash and the recovered id, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow<'a> {
    pub hash: &'a str,
    pub id: Option<u64>,
}

/// Headers used for the CSV output.
#[derive(Debug, Clone, Copy)]
pub struct Headers<'a> {
    pub hash: &'a str,
    pub id: &'a str,
}

fn clean_line(line: &str) -> String {
    line.trim().trim_matches('"').trim().to_string()
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(FinderError::Config(format!(
            "delimiter must be an ASCII character, got {:?}",
            delimiter
        )))
    }
}

/// Read hashes in file order. Row order and duplicates are preserved so the
/// results can be written back positionally.
pub fn read_hashes(path: &Path, source: HashSource<'_>) -> Result<Vec<String>> {
    let file = File::open(path)?;

    let hashes = match source {
        HashSource::Lines => {
            let mut hashes = Vec::new();
            for line in BufReader::new(file).lines() {
                let line = clean_line(&line?);
                if !line.is_empty() {
                    hashes.push(line);
                }
            }
            hashes
        }
        HashSource::Column { name, delimiter } => {
            let mut reader = csv::ReaderBuilder::new()
                .delimiter(delimiter_byte(delimiter)?)
                .has_headers(true)
                .flexible(true)
                .trim(csv::Trim::All)
                .from_reader(file);

            let headers = reader.headers()?.clone();
            if headers.iter().all(|h| h.is_empty()) {
                return Err(FinderError::EmptyInput(path.to_path_buf()));
            }
            let index = headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}') == name)
                .ok_or_else(|| FinderError::ColumnNotFound(name.to_string()))?;

            let mut hashes = Vec::new();
            for record in reader.records() {
                let record = record?;
                hashes.push(record.get(index).unwrap_or_default().to_string());
            }
            hashes
        }
    };

    if hashes.is_empty() {
        return Err(FinderError::EmptyInput(path.to_path_buf()));
    }

    debug!("Read {} hashes from {}", hashes.len(), path.display());
    Ok(hashes)
}

/// Write `rows` to `path` atomically (temp file, then rename).
pub fn write_results(
    path: &Path,
    rows: &[ResultRow<'_>],
    format: OutputFormat,
    headers: Headers<'_>,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension(format!("tmp.{}", std::process::id()));
    let written = write_rows(&temp_path, rows, format, headers);

    match written.and_then(|_| fs::rename(&temp_path, path).map_err(FinderError::from)) {
        Ok(()) => {
            debug!("Wrote {} rows to {}", rows.len(), path.display());
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

fn write_rows(
    path: &Path,
    rows: &[ResultRow<'_>],
    format: OutputFormat,
    headers: Headers<'_>,
) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);

    match format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record([headers.hash, headers.id])?;
            for row in rows {
                let id = row.id.map(|id| id.to_string()).unwrap_or_default();
                writer.write_record([row.hash, id.as_str()])?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            let mut writer = file;
            serde_json::to_writer_pretty(&mut writer, rows)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_input(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_lines_skips_blank() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "hashes.txt", "aa\n\n  bb  \ncc\n\n");
        let hashes = read_hashes(&path, HashSource::Lines).unwrap();
        assert_eq!(hashes, vec!["aa", "bb", "cc"]);
    }

    #[test]
    fn test_read_column_preserves_order_and_gaps() {
        let dir = TempDir::new().unwrap();
        let path = write_input(
            &dir,
            "hashes.csv",
            "Name,Trader Hash,Other\nx,\"aa\",1\ny,,2\nz\nw,aa,3\n",
        );
        let hashes = read_hashes(
            &path,
            HashSource::Column {
                name: "Trader Hash",
                delimiter: ',',
            },
        )
        .unwrap();
        assert_eq!(hashes, vec!["aa", "", "", "aa"]);
    }

    #[test]
    fn test_read_column_with_other_delimiter() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "hashes.tsv", "\u{feff}hash\tid\nab\t1\ncd\t2\n");
        let hashes = read_hashes(
            &path,
            HashSource::Column {
                name: "hash",
                delimiter: '\t',
            },
        )
        .unwrap();
        assert_eq!(hashes, vec!["ab", "cd"]);
    }

    #[test]
    fn test_read_column_with_quoted_delimiter() {
        let digest = "73475cb40a568e8da8a045ced110137e159f890ac4da883b6b17dc651b3a8049";
        let dir = TempDir::new().unwrap();
        let path = write_input(
            &dir,
            "traders.csv",
            &format!(
                "Name,\"Trader Hash\",Note\n\"Doe, John\",{},\"said \"\"hi\"\", left\"\n",
                digest
            ),
        );

        let hashes = read_hashes(
            &path,
            HashSource::Column {
                name: "Trader Hash",
                delimiter: ',',
            },
        )
        .unwrap();
        assert_eq!(hashes, vec![digest]);

        let notes = read_hashes(
            &path,
            HashSource::Column {
                name: "Note",
                delimiter: ',',
            },
        )
        .unwrap();
        assert_eq!(notes, vec!["said \"hi\", left"]);
    }

    #[test]
    fn test_written_csv_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        let rows = vec![
            ResultRow {
                hash: "a,\"b\"",
                id: Some(3),
            },
            ResultRow {
                hash: "plain",
                id: None,
            },
        ];
        write_results(
            &path,
            &rows,
            OutputFormat::Csv,
            Headers {
                hash: "Trader Hash",
                id: "Trader ID",
            },
        )
        .unwrap();

        let hashes = read_hashes(
            &path,
            HashSource::Column {
                name: "Trader Hash",
                delimiter: ',',
            },
        )
        .unwrap();
        assert_eq!(hashes, vec!["a,\"b\"", "plain"]);
    }

    #[test]
    fn test_read_rejects_non_ascii_delimiter() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "hashes.csv", "hash\nab\n");
        let err = read_hashes(
            &path,
            HashSource::Column {
                name: "hash",
                delimiter: '§',
            },
        )
        .unwrap_err();
        assert!(matches!(err, FinderError::Config(_)));
    }

    #[test]
    fn test_read_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "hashes.csv", "a,b\n1,2\n");
        let err = read_hashes(
            &path,
            HashSource::Column {
                name: "Trader Hash",
                delimiter: ',',
            },
        )
        .unwrap_err();
        assert!(matches!(err, FinderError::ColumnNotFound(c) if c == "Trader Hash"));
    }

    #[test]
    fn test_read_empty_input() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "empty.txt", "\n\n");
        assert!(matches!(
            read_hashes(&path, HashSource::Lines).unwrap_err(),
            FinderError::EmptyInput(_)
        ));

        let path = write_input(&dir, "header_only.csv", "hash\n");
        assert!(matches!(
            read_hashes(
                &path,
                HashSource::Column {
                    name: "hash",
                    delimiter: ','
                }
            )
            .unwrap_err(),
            FinderError::EmptyInput(_)
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_hashes(&dir.path().join("nope.txt"), HashSource::Lines).unwrap_err();
        assert!(matches!(err, FinderError::Io(_)));
    }

    #[test]
    fn test_write_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("results.csv");
        let rows = vec![
            ResultRow {
                hash: "aa",
                id: Some(42),
            },
            ResultRow {
                hash: "bb",
                id: None,
            },
            ResultRow {
                hash: "c,\"c\"",
                id: Some(1),
            },
        ];
        write_results(
            &path,
            &rows,
            OutputFormat::Csv,
            Headers {
                hash: "Trader Hash",
                id: "Trader ID",
            },
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Trader Hash,Trader ID\naa,42\nbb,\n\"c,\"\"c\"\"\",1\n");

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let rows = vec![
            ResultRow {
                hash: "aa",
                id: Some(42),
            },
            ResultRow {
                hash: "bb",
                id: None,
            },
        ];
        write_results(
            &path,
            &rows,
            OutputFormat::Json,
            Headers { hash: "h", id: "i" },
        )
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                { "hash": "aa", "id": 42 },
                { "hash": "bb", "id": null },
            ])
        );
    }
}
