//! # order: final visiting order of included files
//!
//! Age mode builds a path-segment tree, folds the minimum age of every directory bottom-up, and
//! walks it depth first. At each directory the children are sorted by age, then by
//! [`compare_paths`] on their full path so far. Filename mode skips the tree and sorts the flat
//! list with the same comparison.
//!
//! Both modes finish with [`pin_readme`].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::contract::{Age, AgeRecord, ClassifiedFile, SortMode};

/// Case-insensitive path comparison with the raw string as the final tie-break.
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[derive(Debug)]
pub enum TreeNode {
    File(FileNode),
    Dir(DirNode),
}

#[derive(Debug)]
pub struct FileNode {
    pub file: ClassifiedFile,
    pub age: Age,
}

#[derive(Debug)]
pub struct DirNode {
    pub children: BTreeMap<String, TreeNode>,
    pub age: Age,
}

impl Default for DirNode {
    fn default() -> Self {
        Self {
            children: BTreeMap::new(),
            age: Age::Unknown,
        }
    }
}

impl TreeNode {
    pub fn age(&self) -> Age {
        match self {
            TreeNode::File(file) => file.age,
            TreeNode::Dir(dir) => dir.age,
        }
    }
}

impl DirNode {
    /// Inserts a file under its path segments, creating directories on the way.
    ///
    /// Returns the file back if its path collides with an existing node.
    pub fn insert(&mut self, file: ClassifiedFile, age: Age) -> Result<(), ClassifiedFile> {
        let segments: Vec<String> = file
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let Some((leaf, dirs)) = segments.split_last() else {
            return Err(file);
        };

        let mut node = self;
        for segment in dirs {
            let child = node
                .children
                .entry(segment.clone())
                .or_insert_with(|| TreeNode::Dir(DirNode::default()));
            node = match child {
                TreeNode::Dir(dir) => dir,
                TreeNode::File(_) => return Err(file),
            };
        }

        if node.children.contains_key(leaf) {
            return Err(file);
        }
        node.children
            .insert(leaf.clone(), TreeNode::File(FileNode { file, age }));
        Ok(())
    }

    /// Post-order fold: every directory takes the minimum age of its children.
    pub fn propagate_ages(&mut self) -> Age {
        let mut age = Age::Unknown;
        for child in self.children.values_mut() {
            let child_age = match child {
                TreeNode::File(file) => file.age,
                TreeNode::Dir(dir) => dir.propagate_ages(),
            };
            age = age.min(child_age);
        }
        self.age = age;
        age
    }

    fn visit(self, prefix: &str, out: &mut Vec<ClassifiedFile>) {
        let mut children: Vec<(String, TreeNode)> = self
            .children
            .into_iter()
            .map(|(segment, node)| {
                let full = if prefix.is_empty() {
                    segment
                } else {
                    format!("{prefix}/{segment}")
                };
                (full, node)
            })
            .collect();

        children.sort_by(|(path_a, a), (path_b, b)| {
            a.age()
                .cmp(&b.age())
                .then_with(|| compare_paths(path_a, path_b))
        });

        for (full, node) in children {
            match node {
                TreeNode::File(file) => out.push(file.file),
                TreeNode::Dir(dir) => dir.visit(&full, out),
            }
        }
    }
}

/// Builds the tree for `files`, with ages from `ages` and [`Age::Unknown`] elsewhere.
///
/// Files whose path collides with an existing node are returned separately.
pub fn build_tree(files: Vec<ClassifiedFile>, ages: &AgeRecord) -> (DirNode, Vec<ClassifiedFile>) {
    let mut root = DirNode::default();
    let mut collisions = Vec::new();
    for file in files {
        let age = Age::from_record(ages, file.path());
        if let Err(file) = root.insert(file, age) {
            warn!(path = %file.path(), "Path collides with an existing tree node");
            collisions.push(file);
        }
    }
    root.propagate_ages();
    (root, collisions)
}

/// Age-mode order: oldest subtrees first, ties by full path.
pub fn order_by_age(files: Vec<ClassifiedFile>, ages: &AgeRecord) -> Vec<ClassifiedFile> {
    let total = files.len();
    let (root, mut collisions) = build_tree(files, ages);
    let mut out = Vec::with_capacity(total);
    root.visit("", &mut out);

    // Collisions cannot come from a real file system, but they must not vanish either.
    collisions.sort_by(|a, b| compare_paths(a.path(), b.path()));
    out.extend(collisions);
    out
}

/// Filename-mode order: flat case-insensitive path sort.
pub fn order_by_name(mut files: Vec<ClassifiedFile>) -> Vec<ClassifiedFile> {
    files.sort_by(|a, b| compare_paths(a.path(), b.path()));
    files
}

/// True for a top-level `readme` or `readme.*`, in any case.
pub fn is_top_level_readme(path: &str) -> bool {
    if path.contains('/') {
        return false;
    }
    let lower = path.to_lowercase();
    lower == "readme" || lower.starts_with("readme.")
}

/// Moves the first top-level README to the front.
pub fn pin_readme(files: &mut Vec<ClassifiedFile>) {
    if let Some(index) = files.iter().position(|f| is_top_level_readme(f.path())) {
        if index > 0 {
            let readme = files.remove(index);
            debug!(path = %readme.path(), from = index, "Pinned README to the front");
            files.insert(0, readme);
        }
    }
}

/// Orders included files for assembly. `ages` is only consulted in age mode.
pub fn order_files(
    files: Vec<ClassifiedFile>,
    mode: SortMode,
    ages: &AgeRecord,
) -> Vec<ClassifiedFile> {
    let mut ordered = match mode {
        SortMode::Age => order_by_age(files, ages),
        SortMode::Filename => order_by_name(files),
    };
    pin_readme(&mut ordered);
    ordered
}
