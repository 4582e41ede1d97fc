use super::base::{DocumentStore, Lease, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// One JSON-lines file per collection under a base directory.
///
/// Renames map onto `fs::rename`, which replaces the target in one step on
/// the same filesystem.
#[derive(Clone)]
pub struct DiskStore {
    base_path: PathBuf,
}

impl DiskStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> StorageResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn collection_path(&self, collection: &str) -> StorageResult<PathBuf> {
        if collection.is_empty()
            || collection.contains(['/', '\\'])
            || collection.starts_with('.')
        {
            return Err(StorageError::OperationError(format!(
                "invalid collection name: {:?}",
                collection
            )));
        }
        Ok(self.base_path.join(format!("{}.jsonl", collection)))
    }

    fn lease_path(&self, name: &str) -> StorageResult<PathBuf> {
        self.collection_path(name)
            .map(|path| path.with_extension("lease.json"))
    }

    fn read_lines(path: &Path) -> StorageResult<Vec<Value>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            documents.push(serde_json::from_str(&line)?);
        }
        Ok(documents)
    }

    fn write_lines(path: &Path, documents: &[Value], append: bool) -> StorageResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(append)
            .write(true)
            .truncate(!append)
            .open(path)?;
        let mut buffer = String::new();
        for document in documents {
            buffer.push_str(&serde_json::to_string(document)?);
            buffer.push('\n');
        }
        file.write_all(buffer.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    fn read_lease(path: &Path) -> StorageResult<Option<Lease>> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl DocumentStore for DiskStore {
    async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> StorageResult<()> {
        let path = self.collection_path(collection)?;
        Self::write_lines(&path, &documents, true)?;
        debug!("Appended {} documents to {}", documents.len(), path.display());
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> StorageResult<()> {
        match fs::remove_file(self.collection_path(collection)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn rename(
        &self,
        source: &str,
        destination: &str,
        drop_target: bool,
    ) -> StorageResult<()> {
        let from = self.collection_path(source)?;
        let to = self.collection_path(destination)?;

        if !from.exists() {
            return Err(StorageError::NotFound(source.to_string()));
        }
        if to.exists() && !drop_target {
            return Err(StorageError::OperationError(format!(
                "target collection {} already exists",
                destination
            )));
        }

        fs::rename(&from, &to)?;
        Ok(())
    }

    async fn copy_all(&self, source: &str, destination: &str) -> StorageResult<()> {
        let documents = Self::read_lines(&self.collection_path(source)?)?;
        let to = self.collection_path(destination)?;
        let scratch = to.with_extension("jsonl.partial");

        Self::write_lines(&scratch, &documents, false)?;
        fs::rename(&scratch, &to)?;
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> StorageResult<Vec<Value>> {
        Self::read_lines(&self.collection_path(collection)?)
    }

    async fn try_acquire_lease(&self, lease: &Lease) -> StorageResult<bool> {
        let path = self.lease_path(&lease.name)?;
        let body = serde_json::to_string(lease)?;

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(body.as_bytes())?;
                file.sync_all()?;
                return Ok(true);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(current) = Self::read_lease(&path)? {
            if !current.yields_to(&lease.owner, Utc::now()) {
                return Ok(false);
            }
        }

        let scratch = path.with_extension("partial");
        fs::write(&scratch, body)?;
        fs::rename(&scratch, &path)?;
        Ok(true)
    }

    async fn renew_lease(&self, lease: &Lease) -> StorageResult<bool> {
        let path = self.lease_path(&lease.name)?;
        match Self::read_lease(&path)? {
            Some(current) if current.owner == lease.owner => {
                let scratch = path.with_extension("partial");
                fs::write(&scratch, serde_json::to_string(lease)?)?;
                fs::rename(&scratch, &path)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_lease(&self, name: &str, owner: &str) -> StorageResult<()> {
        let path = self.lease_path(name)?;
        match Self::read_lease(&path)? {
            Some(current) if current.owner == owner => {
                fs::remove_file(&path)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
