use std::fs;
use std::path::{Path, PathBuf};

/// Find a regular file called `file_name` under `dir`, preferring the shallowest match
pub fn find_file_named(dir: &Path, file_name: &str) -> std::io::Result<Option<PathBuf>> {
    let mut pending = vec![dir.to_path_buf()];

    while !pending.is_empty() {
        let mut next_level = Vec::new();
        for current in pending {
            let mut entries: Vec<_> = fs::read_dir(&current)?.collect::<Result<_, _>>()?;
            entries.sort_by_key(|entry| entry.file_name());

            for entry in entries {
                let path = entry.path();
                let file_type = entry.file_type()?;
                if file_type.is_dir() {
                    next_level.push(path);
                } else if file_type.is_file() && entry.file_name() == file_name {
                    return Ok(Some(path));
                }
            }
        }
        pending = next_level;
    }

    Ok(None)
}
