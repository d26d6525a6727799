use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve the data directory from, in order of priority:
    /// 1. An explicit path (from --data-dir)
    /// 2. The SIMSAPA_DATA_DIR environment variable
    /// 3. The XDG data directory (~/.local/share/simsapa/)
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Ok(val) = std::env::var("SIMSAPA_DATA_DIR") {
            PathBuf::from(val)
        } else {
            xdg::BaseDirectories::with_prefix("simsapa")
                .get_data_home()
                .ok_or_else(|| {
                    Error::Config(
                        "could not determine XDG data home directory".into(),
                    )
                })?
        };

        std::fs::create_dir_all(&root)
            .map_err(|_| Error::DataDir(root.clone()))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The bundled text corpus.
    pub fn appdata_db(&self) -> PathBuf {
        self.root.join("appdata.sqlite3")
    }

    /// Texts imported by the user.
    pub fn userdata_db(&self) -> PathBuf {
        self.root.join("userdata.sqlite3")
    }

    pub fn config_db(&self) -> PathBuf {
        self.root.join("config.redb")
    }

    pub fn index_dir(&self) -> PathBuf {
        self.root.join("index")
    }

    pub fn suttas_index_dir(&self, lang: &str) -> Result<PathBuf> {
        let path = self.index_dir().join("suttas").join(lang);
        std::fs::create_dir_all(&path)
            .map_err(|_| Error::DataDir(path.clone()))?;
        Ok(path)
    }

    pub fn dict_words_index_dir(&self, lang: &str) -> Result<PathBuf> {
        let path = self.index_dir().join("dict_words").join(lang);
        std::fs::create_dir_all(&path)
            .map_err(|_| Error::DataDir(path.clone()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_with_explicit_path() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::resolve(Some(tmp.path())).unwrap();

        assert_eq!(dir.root(), tmp.path());
        assert_eq!(dir.appdata_db(), tmp.path().join("appdata.sqlite3"));
        assert_eq!(dir.userdata_db(), tmp.path().join("userdata.sqlite3"));
        assert_eq!(dir.config_db(), tmp.path().join("config.redb"));
    }

    #[test]
    fn language_index_dirs_are_created() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::resolve(Some(tmp.path())).unwrap();

        let suttas = dir.suttas_index_dir("pli").unwrap();
        assert!(suttas.exists());
        assert_eq!(suttas, tmp.path().join("index/suttas/pli"));

        let words = dir.dict_words_index_dir("en").unwrap();
        assert!(words.exists());
        assert_eq!(words, tmp.path().join("index/dict_words/en"));
    }
}
