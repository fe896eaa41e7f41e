use serde::{Deserialize, Serialize};

/// One line inside a diff hunk, classified by its leading character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffLine {
    Added { new_line: u32, content: String },
    Removed { old_line: u32, content: String },
    Context { old_line: u32, new_line: u32, content: String },
}

impl DiffLine {
    /// Post-image line number this line occupies, if any (added/context only).
    pub fn new_line_no(&self) -> Option<u32> {
        match self {
            DiffLine::Added { new_line, .. } => Some(*new_line),
            DiffLine::Context { new_line, .. } => Some(*new_line),
            DiffLine::Removed { .. } => None,
        }
    }
}

/// A contiguous block of changes, as delimited by one `@@ ... @@` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub lines: Vec<DiffLine>,
}

/// All hunks belonging to a single changed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileModification {
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub is_new: bool,
    pub is_deleted: bool,
    pub is_renamed: bool,
    pub is_binary: bool,
    pub hunks: Vec<DiffHunk>,
}

impl FileModification {
    /// True if `path` equals this modification's post-image path.
    pub fn matches_new_path(&self, path: &str) -> bool {
        self.new_path.as_deref() == Some(path)
    }
}

/// A whole parsed unified diff: one document per change request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffDocument {
    pub modifications: Vec<FileModification>,
}

impl DiffDocument {
    pub fn new(modifications: Vec<FileModification>) -> Self {
        Self { modifications }
    }

    /// Finds the modification whose post-image path equals `path`.
    pub fn find_by_new_path(&self, path: &str) -> Option<&FileModification> {
        self.modifications.iter().find(|m| m.matches_new_path(path))
    }
}
