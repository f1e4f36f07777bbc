//! JSON output.

use crate::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `value` to `path` as pretty-printed JSON with a trailing newline.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_json<T, P>(path: P, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_accidents_json, read_json};
    use roadrisk_core::{AccidentRecord, Severity};
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_accidents_json() {
        let file = NamedTempFile::new().unwrap();
        let records = vec![
            AccidentRecord::new("a1", 10.0, 20.0, Severity::Minor),
            AccidentRecord::new("a2", 10.5, 20.5, Severity::Dangerous).with_weather("Fog"),
        ];

        write_json(file.path(), &records).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("\"severity\": \"dangerous\""));
        assert!(content.ends_with('\n'));

        let parsed = parse_accidents_json(&content).unwrap();
        assert_eq!(parsed.records, records);
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn test_write_slice_and_read_back() {
        let file = NamedTempFile::new().unwrap();
        write_json(file.path(), &[1u32, 2, 3][..]).unwrap();
        let back: Vec<u32> = read_json(file.path()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }
}
