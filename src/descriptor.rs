//! In-memory view of a Jupyter kernel descriptor (`kernel.json`).
//!
//! The document is held as a JSON object so that every key other than
//! `argv` is written back exactly as it was read, in its original order.
//! Numbers keep their source text, so wide integers and decimals such as
//! `0.1` are not re-rendered through `f64`.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PatchError, Result};

const ARGV_KEY: &str = "argv";

#[derive(Debug, Clone)]
pub struct KernelDescriptor {
    path: PathBuf,
    document: Map<String, Value>,
}

impl KernelDescriptor {
    /// Read and validate the descriptor at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| PatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(path, &bytes)
    }

    pub fn from_slice(path: &Path, bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(|source| PatchError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let Value::Object(document) = value else {
            return Err(invalid(path, "document root is not a JSON object"));
        };

        let descriptor = Self {
            path: path.to_path_buf(),
            document,
        };
        let argv = descriptor.argv()?;
        if argv.is_empty() {
            return Err(invalid(path, "'argv' is empty; expected an executable"));
        }
        Ok(descriptor)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The command line, executable first.
    pub fn argv(&self) -> Result<Vec<&str>> {
        let entries = self.argv_entries()?;
        entries
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .ok_or_else(|| invalid(&self.path, "'argv' contains a non-string element"))
            })
            .collect()
    }

    /// True when any argument after the executable starts with `marker`.
    pub fn contains_flag(&self, marker: &str) -> Result<bool> {
        Ok(self
            .argv()?
            .iter()
            .skip(1)
            .any(|arg| arg.starts_with(marker)))
    }

    /// Insert `argument` at `index`, shifting later arguments. Nothing is replaced.
    pub fn insert_argument(&mut self, index: usize, argument: &str) -> Result<()> {
        let path = self.path.clone();
        let entries = self
            .document
            .get_mut(ARGV_KEY)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| invalid(&path, "missing 'argv' array"))?;
        if index > entries.len() {
            return Err(PatchError::InvalidDescriptor {
                path,
                reason: format!(
                    "cannot insert at argv position {index}; argv has {} elements",
                    entries.len()
                ),
            });
        }
        entries.insert(index, Value::String(argument.to_string()));
        Ok(())
    }

    /// Overwrite the file at [`Self::path`] with the current document.
    ///
    /// Output is pretty-printed with a trailing newline rather than kept in
    /// the input's layout. Keys, key order and number literals are written
    /// back as read.
    ///
    /// The write is not atomic: a failure part way through may leave the
    /// file truncated.
    pub fn persist(&self) -> Result<()> {
        let mut bytes =
            serde_json::to_vec_pretty(&self.document).map_err(|err| PatchError::Write {
                path: self.path.clone(),
                source: err.into(),
            })?;
        bytes.push(b'\n');
        fs::write(&self.path, bytes).map_err(|source| PatchError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn argv_entries(&self) -> Result<&Vec<Value>> {
        match self.document.get(ARGV_KEY) {
            Some(Value::Array(entries)) => Ok(entries),
            Some(_) => Err(invalid(&self.path, "'argv' is not an array")),
            None => Err(invalid(&self.path, "missing 'argv'")),
        }
    }
}

fn invalid(path: &Path, reason: &str) -> PatchError {
    PatchError::InvalidDescriptor {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use tempfile::TempDir;

    fn parse(raw: &str) -> Result<KernelDescriptor> {
        KernelDescriptor::from_slice(Path::new("kernel.json"), raw.as_bytes())
    }

    #[test]
    fn test_argv() {
        let descriptor =
            parse(r#"{"argv": ["julia", "-i", "{connection_file}"], "language": "julia"}"#)
                .unwrap();
        assert_eq!(
            descriptor.argv().unwrap(),
            vec!["julia", "-i", "{connection_file}"]
        );
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = parse("{\"argv\": [").unwrap_err();
        assert!(matches!(err, PatchError::Parse { .. }));
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        for raw in [
            r#"["julia"]"#,
            r#"{"display_name": "Julia"}"#,
            r#"{"argv": "julia"}"#,
            r#"{"argv": ["julia", 3]}"#,
            r#"{"argv": []}"#,
        ] {
            let err = parse(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parse, "input: {raw}");
        }
    }

    #[test]
    fn test_insert_shifts_later_arguments() {
        let mut descriptor = parse(r#"{"argv": ["julia", "-i", "conn.json"]}"#).unwrap();
        descriptor.insert_argument(1, "-J/sys.so").unwrap();
        assert_eq!(
            descriptor.argv().unwrap(),
            vec!["julia", "-J/sys.so", "-i", "conn.json"]
        );
    }

    #[test]
    fn test_insert_out_of_range() {
        let mut descriptor = parse(r#"{"argv": ["julia"]}"#).unwrap();
        assert!(descriptor.insert_argument(5, "-J/sys.so").is_err());
    }

    #[test]
    fn test_contains_flag_ignores_executable() {
        let descriptor = parse(r#"{"argv": ["-Jweird-julia", "-i"]}"#).unwrap();
        assert!(!descriptor.contains_flag("-J").unwrap());

        let descriptor = parse(r#"{"argv": ["julia", "-i", "-J/sys.so"]}"#).unwrap();
        assert!(descriptor.contains_flag("-J").unwrap());
    }

    #[test]
    fn test_persist_preserves_other_keys_and_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("kernel.json");
        fs::write(
            &path,
            r#"{"display_name": "Julia 1.10", "argv": ["julia"], "language": "julia", "env": {"JULIA_NUM_THREADS": "4"}, "interrupt_mode": "message"}"#,
        )
        .unwrap();

        let mut descriptor = KernelDescriptor::load(&path).unwrap();
        descriptor.insert_argument(1, "-J/work/sys.so").unwrap();
        descriptor.persist().unwrap();

        let written: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            json!({
                "display_name": "Julia 1.10",
                "argv": ["julia", "-J/work/sys.so"],
                "language": "julia",
                "env": {"JULIA_NUM_THREADS": "4"},
                "interrupt_mode": "message"
            })
        );
        let keys: Vec<&str> = written
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            vec!["display_name", "argv", "language", "env", "interrupt_mode"]
        );
    }

    #[test]
    fn test_persist_keeps_number_literals() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("kernel.json");
        let raw = r#"{"argv":["julia"],"metadata":{"id":123456789012345678901234567890,"x":0.1}}"#;
        fs::write(&path, raw).unwrap();

        let mut descriptor = KernelDescriptor::load(&path).unwrap();
        descriptor.insert_argument(1, "-J/work/sys.so").unwrap();
        descriptor.persist().unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"id\": 123456789012345678901234567890"));
        assert!(written.contains("\"x\": 0.1"));

        let before: Value = serde_json::from_str(raw).unwrap();
        let after: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(
            after["metadata"].to_string(),
            before["metadata"].to_string()
        );
    }

    #[test]
    fn test_persist_failure_is_io() {
        let temp = TempDir::new().unwrap();
        let descriptor =
            KernelDescriptor::from_slice(temp.path(), br#"{"argv": ["julia"]}"#).unwrap();

        let err = descriptor.persist().unwrap_err();
        assert!(matches!(err, PatchError::Write { .. }));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_load_missing_file_is_io() {
        let temp = TempDir::new().unwrap();
        let err = KernelDescriptor::load(&temp.path().join("kernel.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
