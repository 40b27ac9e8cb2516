//! Path helpers for the Quill data directory.

use std::path::PathBuf;

/// Get the Quill data directory (e.g. `~/.quill/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".quill")
}

/// Get the conversation blob path (e.g. `~/.quill/conversations.json`).
pub fn get_conversations_path() -> PathBuf {
    get_data_path().join("conversations.json")
}

/// Helper to get home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_path_ends_with_quill() {
        assert!(get_data_path().ends_with(".quill"));
    }

    #[test]
    fn test_conversations_path() {
        let path = get_conversations_path();
        assert!(path.ends_with("conversations.json"));
        assert!(path.parent().unwrap().ends_with(".quill"));
    }
}
