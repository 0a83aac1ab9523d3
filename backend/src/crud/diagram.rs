use crate::engine::types::Diagram;
use crate::engine::validator::{DiagramError, parse_diagram};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

const EXTENSION: &str = "json";

pub async fn load_diagram(path: &Path) -> Result<Diagram, DiagramError> {
    /// Load and validate a diagram file
    ///
    /// # Arguments
    ///  path: &Path - Location of the JSON document
    ///
    /// # Returns
    ///  Result<Diagram, DiagramError> - NotFound if the file is absent,
    ///  Parse or Validation if its content is unusable
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DiagramError::NotFound(path.to_path_buf()));
        }
        Err(e) => {
            log::error!("Error reading diagram {}: {:?}", path.display(), e);
            return Err(DiagramError::Io(e));
        }
    };

    parse_diagram(&bytes)
}

/// Write a diagram as pretty-printed canonical JSON, creating parent directories.
pub async fn save_diagram(diagram: &Diagram, path: &Path) -> Result<(), DiagramError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(&diagram.to_document())?;
    let result = fs::write(path, json).await;

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Error writing diagram {}: {:?}", path.display(), e);
            Err(DiagramError::Io(e))
        }
    }
}

/// Named diagrams stored as `<root>/<name>.json`.
#[derive(Debug, Clone)]
pub struct DiagramStore {
    root: PathBuf,
}

impl DiagramStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf, DiagramError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DiagramError::Validation(format!(
                "invalid diagram name '{}'",
                name
            )));
        }
        Ok(self.root.join(format!("{}.{}", name, EXTENSION)))
    }

    pub async fn load(&self, name: &str) -> Result<Diagram, DiagramError> {
        load_diagram(&self.path_for(name)?).await
    }

    pub async fn save(&self, name: &str, diagram: &Diagram) -> Result<(), DiagramError> {
        save_diagram(diagram, &self.path_for(name)?).await
    }

    pub async fn delete(&self, name: &str) -> Result<(), DiagramError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(DiagramError::NotFound(path)),
            Err(e) => Err(DiagramError::Io(e)),
        }
    }

    /// Sorted names of stored diagrams. A missing root lists nothing.
    pub async fn list(&self) -> Result<Vec<String>, DiagramError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DiagramError::Io(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{Edge, Node, NodeKind};
    use tempfile::TempDir;

    fn sample() -> Diagram {
        let mut hazard = Node::new("h", NodeKind::Hazard, "Fire");
        hazard.position = serde_json::json!({"x": 10.0, "y": 20.0});
        hazard
            .extra
            .insert("color".into(), serde_json::json!("#ff0000"));
        Diagram {
            nodes: vec![hazard, Node::new("te", NodeKind::TopEvent, "Ignition")],
            edges: vec![Edge::new("h", "te")],
        }
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = load_diagram(&temp.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, DiagramError::NotFound(_)));
    }

    #[tokio::test]
    async fn save_creates_directories_and_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("deeper").join("d.json");

        save_diagram(&sample(), &path).await.unwrap();
        let loaded = load_diagram(&path).await.unwrap();

        assert_eq!(loaded, sample());
    }

    #[tokio::test]
    async fn invalid_content_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        assert!(matches!(
            load_diagram(&path).await,
            Err(DiagramError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn store_lists_saves_and_deletes() {
        let temp = TempDir::new().unwrap();
        let store = DiagramStore::new(temp.path().join("data"));

        assert!(store.list().await.unwrap().is_empty());
        store.save("zeta", &sample()).await.unwrap();
        store.save("alpha", &sample()).await.unwrap();
        tokio::fs::write(store.root().join("notes.txt"), b"skip")
            .await
            .unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["alpha", "zeta"]);

        store.delete("alpha").await.unwrap();
        assert!(matches!(
            store.load("alpha").await,
            Err(DiagramError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("alpha").await,
            Err(DiagramError::NotFound(_))
        ));
    }

    #[test]
    fn names_cannot_escape_the_root() {
        let store = DiagramStore::new("data");
        assert!(store.path_for("../etc/passwd").is_err());
        assert!(store.path_for("").is_err());
        assert_eq!(
            store.path_for("plant-a_1").unwrap(),
            PathBuf::from("data").join("plant-a_1.json")
        );
    }
}
