//! The attachment a storage instance reads and writes for.

use std::path::Path;

/// Identity of one attachment on one record, as path templates see it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// Owning model, e.g. `users`.
    pub class_name: String,
    /// Attachment name, e.g. `avatars`.
    pub name: String,
    /// Record id.
    pub id: String,
    /// Name of the file as uploaded, if known.
    pub original_filename: Option<String>,
}

impl Attachment {
    pub fn new(class_name: impl Into<String>, name: impl Into<String>, id: impl ToString) -> Self {
        Self {
            class_name: class_name.into(),
            name: name.into(),
            id: id.to_string(),
            original_filename: None,
        }
    }

    pub fn with_original_filename(mut self, filename: impl Into<String>) -> Self {
        self.original_filename = Some(filename.into());
        self
    }

    /// Original filename without its final extension.
    pub fn basename(&self) -> String {
        self.original_filename
            .as_deref()
            .and_then(|f| Path::new(f).file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Final extension of the original filename, without the dot.
    pub fn extension(&self) -> String {
        self.original_filename
            .as_deref()
            .and_then(|f| Path::new(f).extension())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Splits the id into three-character directories: `42` → `000/000/042`.
    ///
    /// Numeric ids are zero-padded to nine digits first; other ids use their
    /// first nine characters.
    pub fn id_partition(&self) -> String {
        let chars: Vec<char> = match self.id.parse::<u64>() {
            Ok(n) => format!("{n:09}").chars().collect(),
            Err(_) => self.id.chars().take(9).collect(),
        };
        chars
            .chunks_exact(3)
            .map(|c| c.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("/")
    }
}
