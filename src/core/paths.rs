use std::path::{Path, PathBuf};

pub struct DataPaths {
    pub root: PathBuf,
    pub database: PathBuf,
    pub vectors: PathBuf,
}

impl DataPaths {
    pub fn from_root(root: PathBuf) -> Self {
        Self {
            database: root.join("guidance.db"),
            vectors: root.join("vectors"),
            root,
        }
    }
}

/// `<dir>/<name>.index`
pub fn index_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.index", name))
}

/// `<dir>/<name>_ids.json`
pub fn ids_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}_ids.json", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = DataPaths::from_root(PathBuf::from("/srv/solace"));
        assert_eq!(paths.database, PathBuf::from("/srv/solace/guidance.db"));
        assert_eq!(
            index_file(&paths.vectors, "narrated-saying"),
            PathBuf::from("/srv/solace/vectors/narrated-saying.index")
        );
        assert_eq!(
            ids_file(&paths.vectors, "scripture"),
            PathBuf::from("/srv/solace/vectors/scripture_ids.json")
        );
    }
}
