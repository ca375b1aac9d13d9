use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tempfile::NamedTempFile;

use crate::core::error::ConvertError;
use crate::core::model::ParagraphSet;
use crate::export::Exporter;

/// Writes a paragraph set as an indented JSON object.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    path: PathBuf,
}

impl JsonExporter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Four-space indentation; non-ASCII text is written as-is.
pub fn to_json_string(paragraphs: &ParagraphSet) -> Result<String, ConvertError> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    paragraphs.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

impl Exporter for JsonExporter {
    // The target only ever appears complete: the document is serialized in
    // memory, written next to it, then renamed over it.
    fn export(&self, paragraphs: &ParagraphSet) -> Result<(), ConvertError> {
        let data = to_json_string(paragraphs)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut staged = staging_file(dir)?;
        staged.write_all(data.as_bytes())?;
        staged.flush()?;
        // An existing target keeps its mode, as an in-place rewrite would.
        if let Ok(existing) = fs::metadata(&self.path) {
            staged.as_file().set_permissions(existing.permissions())?;
        }
        staged.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

/// Temporary sibling of the target. New files get the umask-filtered default
/// mode instead of tempfile's owner-only one.
fn staging_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".pdfparagraphs-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}
