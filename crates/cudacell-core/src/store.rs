//! Source store: named groups of `.cu`/`.h` files.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths::WorkDir;

/// Group whose files are part of every build.
pub const SHARED_GROUP: &str = "shared";

/// Extensions accepted by [`SourceStore::save`].
pub const SOURCE_EXTENSIONS: [&str; 2] = ["cu", "h"];

/// Stores cell sources in group directories under a [`WorkDir`].
#[derive(Debug)]
pub struct SourceStore {
    workdir: WorkDir,
}

impl SourceStore {
    /// Create a store over a working directory.
    pub fn new(workdir: WorkDir) -> Self {
        Self { workdir }
    }

    /// The underlying working directory.
    pub fn workdir(&self) -> &WorkDir {
        &self.workdir
    }

    /// Directory of a group.
    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.workdir.group_dir(group)
    }

    /// Directory of the shared group.
    pub fn shared_dir(&self) -> PathBuf {
        self.workdir.group_dir(SHARED_GROUP)
    }

    /// Whether a group directory exists. Invalid names never exist.
    pub fn exists(&self, group: &str) -> bool {
        validate_group_name(group).is_ok() && self.group_dir(group).is_dir()
    }

    /// Save `content` as `filename` in `group`, replacing any previous file.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGroupName`] or [`Error::InvalidSourceName`]
    /// for names that are not a single path component,
    /// [`Error::InvalidExtension`] unless the name ends in `.cu` or `.h`, or
    /// an IO error if the file cannot be written.
    pub fn save(&self, group: &str, filename: &str, content: &str) -> Result<PathBuf> {
        validate_group_name(group)?;
        validate_source_name(filename)?;

        let group_dir = self.group_dir(group);
        fs::create_dir_all(&group_dir)?;

        let path = group_dir.join(filename);
        fs::write(&path, content)?;
        tracing::debug!("Saved {} ({} bytes)", path.display(), content.len());

        Ok(path)
    }

    /// Read a saved file back.
    pub fn read(&self, group: &str, filename: &str) -> Result<String> {
        validate_group_name(group)?;
        validate_source_name(filename)?;
        Ok(fs::read_to_string(self.group_dir(group).join(filename))?)
    }

    /// Remove a group and everything in it. Missing groups are ignored.
    pub fn delete(&self, group: &str) -> Result<()> {
        validate_group_name(group)?;
        let group_dir = self.group_dir(group);
        if group_dir.exists() {
            fs::remove_dir_all(&group_dir)?;
            tracing::debug!("Deleted group {}", group);
        }
        Ok(())
    }

    /// Names of all groups, sorted.
    pub fn groups(&self) -> Result<Vec<String>> {
        let mut groups = Vec::new();
        for entry in fs::read_dir(self.workdir.root())? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                groups.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        groups.sort();
        Ok(groups)
    }

    /// Names of the files in a group, sorted.
    ///
    /// # Errors
    /// Returns [`Error::GroupNotFound`] if the group does not exist.
    pub fn files(&self, group: &str) -> Result<Vec<String>> {
        validate_group_name(group)?;
        let group_dir = self.group_dir(group);
        if !group_dir.is_dir() {
            return Err(Error::GroupNotFound(group.to_string()));
        }
        let mut files: Vec<String> = list_files(&group_dir, None)?
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        files.sort();
        Ok(files)
    }
}

/// Check that a group name is one plain directory name inside the work
/// directory.
pub fn validate_group_name(group: &str) -> Result<()> {
    if is_plain_name(group) {
        Ok(())
    } else {
        Err(Error::InvalidGroupName(group.to_string()))
    }
}

/// Check that a source name is a plain file name with an allowed extension.
pub fn validate_source_name(filename: &str) -> Result<()> {
    if !is_plain_name(filename) {
        return Err(Error::InvalidSourceName(filename.to_string()));
    }

    let extension = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    if SOURCE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(Error::InvalidExtension {
            name: filename.to_string(),
            extension: if extension.is_empty() {
                String::new()
            } else {
                format!(".{}", extension)
            },
        })
    }
}

/// Exactly one normal path component: not empty, `.`, `..`, absolute or
/// containing a separator.
fn is_plain_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

/// Regular files directly inside `dir`, optionally filtered by extension,
/// sorted by path. A missing directory yields an empty list.
pub(crate) fn list_files(dir: &Path, extension: Option<&str>) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let matches = extension.is_none_or(|ext| path.extension().is_some_and(|e| e == ext));
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
