// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem artifact store.
//!
//! Layout under the backups root:
//!
//! ```text
//! backups/
//!   moodle_backup_20260314_010509.tar.gz      staging
//!   moodle_db_backup_20260314_010509.tar.gz   staging
//!   daily/moodle_daily_application_20260314.tar.gz
//!   weekly/...
//!   monthly/...
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use keeper_core::{Artifact, ArtifactStore, KeeperError, Namespace, sort_newest_first};
use tracing::debug;

/// Artifact store rooted at a backups directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `namespace`'s artifacts.
    pub fn namespace_dir(&self, namespace: Namespace) -> PathBuf {
        match namespace {
            Namespace::Staging => self.root.clone(),
            Namespace::Tier(tier) => self.root.join(tier.to_string()),
        }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    fn path_for(&self, artifact: &Artifact) -> PathBuf {
        self.namespace_dir(artifact.namespace)
            .join(artifact.file_name())
    }

    async fn list_namespace(&self, namespace: Namespace) -> Result<Vec<Artifact>, KeeperError> {
        let dir = self.namespace_dir(namespace);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(KeeperError::storage(e)),
        };

        let mut artifacts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(artifact) = Artifact::parse(namespace, name) {
                artifacts.push(artifact);
            }
        }

        sort_newest_first(&mut artifacts);
        Ok(artifacts)
    }

    async fn exists(&self, artifact: &Artifact) -> Result<bool, KeeperError> {
        let path = self.path_for(artifact);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(KeeperError::storage(e)),
        }
    }

    async fn copy(&self, src: &Artifact, dst: &Artifact) -> Result<(), KeeperError> {
        let from = self.path_for(src);
        let to = self.path_for(dst);
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Copy under a name `Artifact::parse` ignores, then rename into place.
        let partial = to.with_file_name(format!(".{}.partial", dst.file_name()));
        if let Err(e) = tokio::fs::copy(&from, &partial).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(KeeperError::storage(e));
        }
        tokio::fs::rename(&partial, &to).await?;

        debug!(from = %from.display(), to = %to.display(), "artifact copied");
        Ok(())
    }

    async fn delete(&self, artifact: &Artifact) -> Result<(), KeeperError> {
        let path = self.path_for(artifact);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "artifact deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KeeperError::storage(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use keeper_core::{Category, Tier};

    fn staged(unit: &str, category: Category, day: u32, hour: u32) -> Artifact {
        let created = NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        Artifact::staged(unit, category, created)
    }

    async fn touch(store: &FsArtifactStore, artifact: &Artifact, body: &str) {
        let path = store.path_for(artifact);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, body).await.unwrap();
    }

    #[tokio::test]
    async fn missing_root_lists_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("does-not-exist"));
        assert!(store.list_namespace(Namespace::Staging).await.unwrap().is_empty());
        assert!(
            store
                .list_namespace(Namespace::Tier(Tier::Monthly))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn staging_listing_skips_foreign_files_and_tier_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let older = staged("moodle", Category::Application, 1, 1);
        let newer = staged("moodle", Category::Application, 2, 1);
        touch(&store, &older, "a").await;
        touch(&store, &newer, "b").await;
        touch(&store, &staged("moodle", Category::Database, 2, 1), "c").await;
        tokio::fs::write(dir.path().join(".scheduler.pid"), "1").await.unwrap();
        tokio::fs::write(dir.path().join("scheduler.log"), "").await.unwrap();
        tokio::fs::create_dir_all(dir.path().join("daily")).await.unwrap();

        let all = store.list_namespace(Namespace::Staging).await.unwrap();
        assert_eq!(all.len(), 3);

        let apps = store
            .list(Namespace::Staging, "moodle", Category::Application)
            .await
            .unwrap();
        assert_eq!(apps, vec![newer, older]);
    }

    #[tokio::test]
    async fn copy_creates_tier_dir_and_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let src = staged("rosario", Category::Database, 14, 2);
        touch(&store, &src, "payload").await;

        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let dst = Artifact::tiered("rosario", Tier::Weekly, Category::Database, date);
        store.copy(&src, &dst).await.unwrap();

        assert!(store.exists(&src).await.unwrap());
        assert!(store.exists(&dst).await.unwrap());
        let copied = tokio::fs::read_to_string(store.path_for(&dst)).await.unwrap();
        assert_eq!(copied, "payload");
        assert_eq!(
            store.path_for(&dst),
            dir.path()
                .join("weekly")
                .join("rosario_weekly_database_20260314.tar.gz")
        );
    }

    #[tokio::test]
    async fn copy_of_missing_source_fails_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let src = staged("rosario", Category::Database, 14, 2);
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let dst = Artifact::tiered("rosario", Tier::Daily, Category::Database, date);

        assert!(store.copy(&src, &dst).await.is_err());
        let mut entries = tokio::fs::read_dir(dir.path().join("daily")).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let artifact = staged("opensis", Category::Application, 3, 4);
        touch(&store, &artifact, "x").await;

        store.delete(&artifact).await.unwrap();
        assert!(!store.exists(&artifact).await.unwrap());
        store.delete(&artifact).await.unwrap();
    }
}
