//! Directory tree rendering with hard depth and breadth caps.

use std::fs;
use std::path::Path;

use super::is_noise_dir;

pub const MAX_DEPTH: usize = 2;
pub const MAX_ENTRIES_PER_DIR: usize = 40;

/// Render the tree under `root`, at most [`MAX_DEPTH`] levels deep and
/// [`MAX_ENTRIES_PER_DIR`] entries per directory. Unreadable directories
/// render as empty.
pub fn render_tree(root: &Path) -> String {
    render_tree_with_limits(root, MAX_DEPTH, MAX_ENTRIES_PER_DIR)
}

pub fn render_tree_with_limits(root: &Path, max_depth: usize, max_entries: usize) -> String {
    let mut lines = vec![format!(
        "{}/",
        root.file_name().and_then(|n| n.to_str()).unwrap_or(".")
    )];
    walk(root, "", 1, max_depth, max_entries, &mut lines);
    lines.join("\n")
}

fn walk(
    current: &Path,
    prefix: &str,
    depth: usize,
    max_depth: usize,
    max_entries: usize,
    lines: &mut Vec<String>,
) {
    if depth > max_depth {
        return;
    }

    let Ok(read_dir) = fs::read_dir(current) else {
        return;
    };

    let mut entries: Vec<(bool, String)> = read_dir
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let is_dir = entry.file_type().ok()?.is_dir();
            let name = entry.file_name().to_string_lossy().to_string();
            if is_dir && is_noise_dir(&name) {
                return None;
            }
            Some((is_dir, name))
        })
        .collect();

    // Directories first, then by name.
    entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let hidden = entries.len().saturating_sub(max_entries);
    entries.truncate(max_entries);

    let shown = entries.len();
    for (idx, (is_dir, name)) in entries.into_iter().enumerate() {
        let is_last = idx + 1 == shown && hidden == 0;
        let connector = if is_last { "└── " } else { "├── " };
        if is_dir {
            lines.push(format!("{}{}{}/", prefix, connector, name));
            let extension = if is_last { "    " } else { "│   " };
            walk(
                &current.join(&name),
                &format!("{}{}", prefix, extension),
                depth + 1,
                max_depth,
                max_entries,
                lines,
            );
        } else {
            lines.push(format!("{}{}{}", prefix, connector, name));
        }
    }

    if hidden > 0 {
        lines.push(format!("{}└── … {} more", prefix, hidden));
    }
}
