use std::path::{Path, PathBuf};

use smol_str::SmolStr;

use crate::base::Position;

/// Opaque identity assigned by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Property,
    PropertyGroup,
    Item,
    ItemGroup,
    ItemMetadata,
    Target,
    Task,
    Import,
    Other,
}

impl ObjectKind {
    pub fn display(&self) -> &'static str {
        match self {
            ObjectKind::Property => "property",
            ObjectKind::PropertyGroup => "property group",
            ObjectKind::Item => "item",
            ObjectKind::ItemGroup => "item group",
            ObjectKind::ItemMetadata => "item metadata",
            ObjectKind::Target => "target",
            ObjectKind::Task => "task",
            ObjectKind::Import => "import",
            ObjectKind::Other => "object",
        }
    }
}

/// Where the engine says an object was declared.
///
/// Lines and columns are one-based; a zero line means the engine has no
/// location for it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// One-based position, or [`Position::INVALID`] when there is none.
    pub fn position(&self) -> Position {
        if self.line == 0 {
            return Position::INVALID;
        }
        Position::one_based(self.line, self.column)
    }

    pub fn is_in(&self, file: &Path) -> bool {
        self.file == file
    }
}

/// One object of an evaluated project. Only identity and locations matter
/// here; values stay inside the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvaluatedObject {
    pub handle: ObjectHandle,
    pub kind: ObjectKind,
    pub name: SmolStr,
    pub locations: Vec<SourceLocation>,
}

impl EvaluatedObject {
    pub fn new(handle: ObjectHandle, kind: ObjectKind, name: impl Into<SmolStr>) -> Self {
        Self {
            handle,
            kind,
            name: name.into(),
            locations: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.locations.push(location);
        self
    }
}
