use std::path::Path;

use crate::error::{DstError, Result};

use super::model::Table;

/// Number of metadata lines preceding the column header in TraceWin ASCII
/// particle files.
pub const SKIPPED_HEADER_LINES: usize = 2;

// ---------------------------------------------------------------------------
// File classification
// ---------------------------------------------------------------------------

/// Storage format of a particle file, decided from its extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// `.txt` – whitespace separated ASCII table.
    Ascii,
    /// `.dst` – TraceWin binary distribution.
    Binary,
}

/// Classify `path` by extension. Unknown extensions are rejected here, before
/// anything is read.
pub fn classify(path: &Path) -> Result<FileFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();

    match ext.as_str() {
        "txt" => Ok(FileFormat::Ascii),
        "dst" => Ok(FileFormat::Binary),
        _ => Err(DstError::UnknownExtension {
            path: path.to_path_buf(),
            ext: format!(".{ext}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a particle table from a file. Dispatch by extension.
///
/// Binary `.dst` files fail unconditionally, whether or not the file exists.
pub fn load_file(path: &Path) -> Result<Table> {
    match classify(path)? {
        FileFormat::Binary => Err(DstError::BinaryNotImplemented(path.to_path_buf())),
        FileFormat::Ascii => {
            let text = std::fs::read_to_string(path).map_err(|e| DstError::io(path, e))?;
            let table = parse_ascii(&text)?;
            log::info!(
                "Loaded {} particles with columns {:?} from {}",
                table.len(),
                table.column_names(),
                path.display()
            );
            Ok(table)
        }
    }
}

// ---------------------------------------------------------------------------
// ASCII parser
// ---------------------------------------------------------------------------

/// Expected layout:
///
/// ```text
/// <metadata line>
/// <metadata line>
/// x(mm) x'(mrad) y(mm) y'(mrad) Phase(deg) Energy(MeV)
/// 0.12  -1.3     0.4   2.2      -3.1       16.52
/// ...
/// ```
///
/// Blank lines are ignored. Every data row must have as many fields as the
/// header.
pub fn parse_ascii(text: &str) -> Result<Table> {
    let mut lines = text
        .lines()
        .enumerate()
        .skip(SKIPPED_HEADER_LINES)
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines.next().ok_or_else(|| DstError::Parse {
        line: SKIPPED_HEADER_LINES + 1,
        message: "missing column header".to_string(),
    })?;
    let names: Vec<String> = header.split_whitespace().map(str::to_string).collect();

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

    for (idx, line) in lines {
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != names.len() {
            return Err(DstError::Parse {
                line: line_no,
                message: format!("expected {} fields, found {}", names.len(), fields.len()),
            });
        }
        for (col, tok) in columns.iter_mut().zip(fields) {
            let value = tok.parse::<f64>().map_err(|_| DstError::Parse {
                line: line_no,
                message: format!("'{tok}' is not a number"),
            })?;
            col.push(value);
        }
    }

    Table::from_columns(names.into_iter().zip(columns).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
TraceWin particle file
1000 particles
x(mm) x'(mrad) y(mm) y'(mrad) Phase(deg) Energy(MeV)
1.0 2.0 3.0 4.0 5.0 16.5

-1.0 -2.0 -3.0 -4.0 -5.0 16.6
";

    #[test]
    fn parses_header_and_rows() {
        let table = parse_ascii(SAMPLE).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_names().len(), 6);
        assert_eq!(table.column("Energy(MeV)").unwrap(), &[16.5, 16.6]);
        assert_eq!(table.column("x'(mrad)").unwrap(), &[2.0, -2.0]);
    }

    #[test]
    fn short_row_reports_line_number() {
        let text = "a\nb\nx y\n1 2\n3\n";
        match parse_ascii(text).unwrap_err() {
            DstError::Parse { line, .. } => assert_eq!(line, 5),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let text = "a\nb\nx y\n1 abc\n";
        assert!(matches!(
            parse_ascii(text),
            Err(DstError::Parse { line: 4, .. })
        ));
    }

    #[test]
    fn missing_header_is_an_error() {
        assert!(parse_ascii("only\nmetadata\n").is_err());
    }

    #[test]
    fn dst_fails_regardless_of_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part_dtl1.dst");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(SAMPLE.as_bytes())
            .unwrap();
        assert!(matches!(
            load_file(&path),
            Err(DstError::BinaryNotImplemented(_))
        ));
        assert!(matches!(
            load_file(Path::new("/does/not/exist.dst")),
            Err(DstError::BinaryNotImplemented(_))
        ));
    }

    #[test]
    fn unknown_extension_fails_before_reading() {
        // The file does not exist: an I/O error would mean a read was attempted.
        let err = load_file(Path::new("/does/not/exist.xyz")).unwrap_err();
        match err {
            DstError::UnknownExtension { ext, .. } => assert_eq!(ext, ".xyz"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn loads_txt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part_rfq.txt");
        std::fs::write(&path, SAMPLE).unwrap();
        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 2);
    }
}
