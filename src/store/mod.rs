//! Flat-file project store.
//!
//! All projects live in one JSON document together with the last issued id.
//! Every mutation is a full read-modify-write of that document. Mutations are
//! serialized through an in-process lock and land on disk through a temp file
//! and rename, so a reader never sees a half-written document. Writers in
//! other processes are not coordinated with; the last rename wins.

mod models;
pub mod views;

pub use models::*;

use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Projects document {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize projects document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid project: {0}")]
    Invalid(String),
}

#[derive(Debug)]
pub struct ProjectStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ProjectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document; a missing file is an empty document
    async fn read_document(&self) -> Result<ProjectsDocument, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Projects document missing, treating as empty");
                return Ok(ProjectsDocument::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_document(&self, document: &ProjectsDocument) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(document)?;
        let tmp_path = self.temp_path();

        tokio::fs::write(&tmp_path, json).await.map_err(write_err)?;
        if let Err(source) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_err(source));
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "projects.json".to_string());
        self.path.with_file_name(format!(
            ".{}.{}.tmp",
            file_name,
            uuid::Uuid::new_v4().simple()
        ))
    }

    /// All projects sorted by `order`. Never fails: an unreadable document is logged and
    /// reads as empty.
    pub async fn list(&self) -> Vec<Project> {
        match self.read_document().await {
            Ok(document) => {
                let mut projects = document.projects;
                views::sort_by_order(&mut projects);
                projects
            }
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    "Error reading projects; serving an empty list until the document is fixed"
                );
                Vec::new()
            }
        }
    }

    pub async fn get(&self, id: u64) -> Option<Project> {
        self.list().await.into_iter().find(|p| p.id == id)
    }

    pub async fn create(&self, new: NewProject) -> Result<Project, StoreError> {
        if new.title.trim().is_empty() {
            return Err(StoreError::Invalid("title is required".to_string()));
        }
        if new.description.trim().is_empty() {
            return Err(StoreError::Invalid("description is required".to_string()));
        }

        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;

        let id = document
            .next_id()
            .ok_or_else(|| StoreError::Invalid("project id counter is exhausted".to_string()))?;

        let now = Utc::now();
        let project = Project {
            id,
            title: new.title,
            description: new.description,
            category: new.category,
            images: new.images,
            featured: new.featured,
            order: new.order,
            created_at: now,
            updated_at: now,
        };

        document.last_id = project.id;
        document.projects.push(project.clone());
        self.write_document(&document).await?;

        info!(project_id = project.id, title = %project.title, "Project created");
        Ok(project)
    }

    /// Merge `patch` into project `id`. Returns `None` if no such project exists.
    pub async fn update(&self, id: u64, patch: ProjectPatch) -> Result<Option<Project>, StoreError> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(StoreError::Invalid("title cannot be empty".to_string()));
        }
        if patch
            .description
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            return Err(StoreError::Invalid("description cannot be empty".to_string()));
        }

        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;

        let Some(project) = document.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        patch.apply(project);
        project.updated_at = Utc::now().max(project.updated_at);
        let updated = project.clone();

        self.write_document(&document).await?;

        info!(project_id = id, "Project updated");
        Ok(Some(updated))
    }

    /// Remove project `id`. Returns whether a project was removed; the document is only
    /// rewritten when it was.
    pub async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;

        let Some(index) = document.projects.iter().position(|p| p.id == id) else {
            return Ok(false);
        };

        document.projects.remove(index);
        self.write_document(&document).await?;

        info!(project_id = id, "Project deleted");
        Ok(true)
    }

    pub async fn by_category(&self, filter: CategoryFilter) -> Vec<Project> {
        views::filter_by_category(self.list().await, filter)
    }

    pub async fn featured(&self) -> Vec<Project> {
        views::featured(self.list().await)
    }

    pub async fn categories(&self) -> Vec<Category> {
        views::categories(&self.list().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ProjectStore {
        ProjectStore::new(dir.path().join("data").join("projects.json"))
    }

    fn villa(title: &str) -> NewProject {
        NewProject::new(title, "Full interior fit-out", Category::Villas)
    }

    #[tokio::test]
    async fn test_list_missing_document_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.list().await.is_empty());
        assert!(store.get(1).await.is_none());
    }

    #[tokio::test]
    async fn test_list_corrupt_document_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = ProjectStore::new(&path);
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let project = store.create(villa("Villa A")).await.unwrap();
        assert_eq!(project.id, 1);
        assert!(!project.featured);
        assert_eq!(project.order, 0);
        assert!(project.images.is_empty());
        assert_eq!(project.created_at, project.updated_at);

        assert_eq!(store.get(1).await, Some(project));
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.create(villa("Villa A")).await.unwrap().id, 1);
        assert_eq!(store.create(villa("Villa B")).await.unwrap().id, 2);
        assert!(store.delete(1).await.unwrap());
        assert_eq!(store.create(villa("Villa C")).await.unwrap().id, 3);

        // Deleting the newest project still does not roll the counter back
        assert!(store.delete(3).await.unwrap());
        assert_eq!(store.create(villa("Villa D")).await.unwrap().id, 4);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["lastId"], 4);
    }

    #[tokio::test]
    async fn test_list_sorted_by_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.create(villa("third").with_order(5)).await.unwrap();
        store.create(villa("first").with_order(-1)).await.unwrap();
        store.create(villa("second").with_order(2)).await.unwrap();

        let titles: Vec<String> = store.list().await.into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let created = store
            .create(villa("Villa A").with_images(vec!["/portfolio/a.jpg".into()]))
            .await
            .unwrap();

        let patch = ProjectPatch {
            title: Some("Villa A (phase 2)".into()),
            featured: Some(true),
            ..Default::default()
        };
        let updated = store.update(created.id, patch).await.unwrap().unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.title, "Villa A (phase 2)");
        assert!(updated.featured);
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.images, created.images);

        assert_eq!(store.get(created.id).await, Some(updated));
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.create(villa("Villa A")).await.unwrap();

        let patch = ProjectPatch {
            order: Some(3),
            ..Default::default()
        };
        assert!(store.update(99, patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_blank_title() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let created = store.create(villa("Villa A")).await.unwrap();

        let patch = ProjectPatch {
            title: Some("  ".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.update(created.id, patch).await,
            Err(StoreError::Invalid(_))
        ));
        assert_eq!(store.get(created.id).await.unwrap().title, "Villa A");
    }

    #[tokio::test]
    async fn test_delete_unknown_id_leaves_document_untouched() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.create(villa("Villa A")).await.unwrap();

        let before = std::fs::read_to_string(store.path()).unwrap();
        assert!(!store.delete(42).await.unwrap());
        let after = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_mutation_refuses_to_overwrite_corrupt_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let store = ProjectStore::new(&path);
        assert!(matches!(
            store.create(villa("Villa A")).await,
            Err(StoreError::Corrupt { .. })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1, 2");
    }

    #[tokio::test]
    async fn test_unknown_category_names_the_bad_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects.json");
        let content = r#"{
  "projects": [
    {"id": 1, "title": "Marina", "description": "Deck", "category": "Yachts",
     "createdAt": "2025-03-01T10:00:00Z", "updatedAt": "2025-03-01T10:00:00Z"}
  ],
  "lastId": 1
}"#;
        std::fs::write(&path, content).unwrap();

        let store = ProjectStore::new(&path);
        assert!(store.list().await.is_empty());

        let err = store.create(villa("Villa A")).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        let message = err.to_string();
        assert!(message.contains("Yachts"), "{}", message);
        assert!(message.contains("line 3"), "{}", message);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[tokio::test]
    async fn test_exhausted_id_counter_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects.json");
        let content = format!(r#"{{"projects": [], "lastId": {}}}"#, u64::MAX);
        std::fs::write(&path, &content).unwrap();

        let store = ProjectStore::new(&path);
        assert!(matches!(
            store.create(villa("Villa A")).await,
            Err(StoreError::Invalid(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.create(villa("")).await.is_err());
        assert!(store
            .create(NewProject::new("Villa A", " ", Category::Villas))
            .await
            .is_err());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(villa(&format!("Villa {}", i))).await.unwrap().id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=10).collect::<Vec<u64>>());
        assert_eq!(store.list().await.len(), 10);
    }

    #[tokio::test]
    async fn test_derived_views() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.create(villa("Villa A").with_order(2)).await.unwrap();
        store
            .create(
                NewProject::new("Grand Hotel", "Lobby and suites", Category::Hotels)
                    .with_featured(true)
                    .with_order(1),
            )
            .await
            .unwrap();
        store
            .create(villa("Villa B").with_featured(true).with_order(0))
            .await
            .unwrap();

        assert_eq!(store.by_category(CategoryFilter::All).await.len(), 3);
        assert_eq!(
            store
                .by_category(CategoryFilter::Only(Category::Villas))
                .await
                .len(),
            2
        );

        let featured: Vec<String> = store.featured().await.into_iter().map(|p| p.title).collect();
        assert_eq!(featured, vec!["Villa B", "Grand Hotel"]);

        assert_eq!(
            store.categories().await,
            vec![Category::Hotels, Category::Villas]
        );
    }
}
