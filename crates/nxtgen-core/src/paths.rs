use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const NXTGEN_DIR: &str = ".nxtgen";
pub const CONFIG_FILE: &str = ".nxtgen/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn nxtgen_dir(root: &Path) -> PathBuf {
    root.join(NXTGEN_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_lives_under_dot_dir() {
        let root = Path::new("/srv/ops");
        assert_eq!(config_path(root), PathBuf::from("/srv/ops/.nxtgen/config.yaml"));
        assert!(config_path(root).starts_with(nxtgen_dir(root)));
    }
}
