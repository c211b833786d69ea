use crate::core::extensions::ExtensionSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Invalid root: {path} is not a directory")]
    InvalidRoot { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Walk {
        path: String,
        #[source]
        source: walkdir::Error,
    },
}

impl From<walkdir::Error> for ClassifyError {
    fn from(source: walkdir::Error) -> Self {
        let path = source
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        ClassifyError::Walk { path, source }
    }
}

/// Result of classifying one directory tree.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Every directory in pre-order with its image-only verdict.
    pub folders: Vec<(PathBuf, bool)>,
}

impl Classification {
    /// The root's verdict (first entry).
    pub fn root_is_image_only(&self) -> bool {
        self.folders.first().map(|(_, ok)| *ok).unwrap_or(false)
    }

    /// Image-only folders, parent before children.
    pub fn image_only(&self) -> Vec<PathBuf> {
        self.folders
            .iter()
            .filter(|(_, ok)| *ok)
            .map(|(path, _)| path.clone())
            .collect()
    }
}

enum NodeKind {
    Dir { has_files: bool, disqualified: bool },
    Image,
    Other,
}

struct Node {
    path: PathBuf,
    parent: Option<usize>,
    kind: NodeKind,
}

/// Labels directories whose whole subtree is made of image files.
///
/// A folder is image-only when every direct file has a recognized extension,
/// every subfolder is itself image-only, and it holds at least one direct file.
/// Subfolders never lend their files to the parent.
pub struct FolderClassifier {
    extensions: ExtensionSet,
    max_depth: Option<usize>,
}

impl FolderClassifier {
    pub fn new(extensions: ExtensionSet) -> Self {
        Self {
            extensions,
            max_depth: None,
        }
    }

    /// Stop descending below `max_depth` (root is depth 0). A directory at the
    /// limit has no visible files and is never image-only.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn is_image_only(&self, folder: &Path) -> Result<bool, ClassifyError> {
        Ok(self.classify(folder)?.root_is_image_only())
    }

    /// All image-only folders under `root`, root included, in pre-order.
    /// Image-only folders below a disqualified parent are still reported.
    pub fn find_image_only_folders(&self, root: &Path) -> Result<Vec<PathBuf>, ClassifyError> {
        let folders = self.classify(root)?.image_only();
        log::info!(
            "Found {} image-only folder(s) under {}",
            folders.len(),
            root.display()
        );
        Ok(folders)
    }

    /// Walk `root` once and classify every directory in it.
    ///
    /// Entries are visited in pre-order, so walking the list backwards sees
    /// every descendant before its ancestor.
    pub fn classify(&self, root: &Path) -> Result<Classification, ClassifyError> {
        if !root.is_dir() {
            return Err(ClassifyError::InvalidRoot {
                path: root.to_path_buf(),
            });
        }

        let mut walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name();
        if let Some(max_depth) = self.max_depth {
            walker = walker.max_depth(max_depth);
        }

        let mut nodes: Vec<Node> = Vec::new();
        // dir_stack[d] is the index of the open directory at depth d
        let mut dir_stack: Vec<usize> = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if is_dangling_link(&err) => {
                    log::debug!("Ignoring dangling link: {}", err);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let depth = entry.depth();
            dir_stack.truncate(depth);
            let parent = depth.checked_sub(1).and_then(|d| dir_stack.get(d).copied());

            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                NodeKind::Dir {
                    has_files: false,
                    disqualified: false,
                }
            } else if file_type.is_file() {
                if self.extensions.matches(entry.path()) {
                    NodeKind::Image
                } else {
                    NodeKind::Other
                }
            } else {
                // fifos, sockets, devices
                log::debug!("Ignoring special entry {}", entry.path().display());
                continue;
            };

            let is_dir = matches!(kind, NodeKind::Dir { .. });
            nodes.push(Node {
                path: entry.into_path(),
                parent,
                kind,
            });
            if is_dir {
                dir_stack.push(nodes.len() - 1);
            }
        }

        let mut verdicts = vec![false; nodes.len()];
        for idx in (0..nodes.len()).rev() {
            // (counts as a direct file, disqualifies the parent)
            let (is_file, disqualifies) = match nodes[idx].kind {
                NodeKind::Image => (true, false),
                NodeKind::Other => (true, true),
                NodeKind::Dir {
                    has_files,
                    disqualified,
                } => {
                    let ok = has_files && !disqualified;
                    verdicts[idx] = ok;
                    (false, !ok)
                }
            };

            if let Some(parent) = nodes[idx].parent {
                if let NodeKind::Dir {
                    has_files,
                    disqualified,
                } = &mut nodes[parent].kind
                {
                    *has_files |= is_file;
                    *disqualified |= disqualifies;
                }
            }
        }

        let folders = nodes
            .into_iter()
            .zip(verdicts)
            .filter(|(node, _)| matches!(node.kind, NodeKind::Dir { .. }))
            .map(|(node, ok)| (node.path, ok))
            .collect();

        Ok(Classification { folders })
    }
}

/// A link whose target is gone is neither a file nor a folder, so it is skipped
/// like any other special entry. Loops and unreadable folders still fail.
fn is_dangling_link(err: &walkdir::Error) -> bool {
    if err.loop_ancestor().is_some() {
        return false;
    }
    err.path()
        .map(|path| {
            let is_link = fs::symlink_metadata(path)
                .map(|m| m.file_type().is_symlink())
                .unwrap_or(false);
            is_link && fs::metadata(path).is_err()
        })
        .unwrap_or(false)
}
