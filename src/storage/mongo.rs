use super::base::{DocumentStore, Lease, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use log::{debug, info};
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, ReturnDocument, ServerApi, ServerApiVersion};
use mongodb::{Client, Collection, Database};
use serde_json::Value;

const DUPLICATE_KEY: i32 = 11000;
const NAMESPACE_NOT_FOUND: i32 = 26;
const LEASE_ID: &str = "lease";

pub struct MongoStore {
    database_name: String,
    client: Client,
}

impl MongoStore {
    pub async fn new(connection_string: &str, database_name: &str) -> StorageResult<Self> {
        let mut options = ClientOptions::parse(connection_string).await?;
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        let client = Client::with_options(options)?;
        info!("Connected to MongoDB database {}", database_name);
        Ok(Self {
            database_name: database_name.to_string(),
            client,
        })
    }

    fn database(&self) -> Database {
        self.client.database(&self.database_name)
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database().collection(name)
    }

    fn namespace(&self, collection: &str) -> String {
        format!("{}.{}", self.database_name, collection)
    }
}

fn error_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(e) => Some(e.code),
        ErrorKind::Write(WriteFailure::WriteError(e)) => Some(e.code),
        _ => None,
    }
}

fn to_document(value: Value) -> StorageResult<Document> {
    mongodb::bson::to_document(&value).map_err(StorageError::from)
}

fn to_value(mut document: Document) -> Value {
    document.remove("_id");
    Bson::Document(document).into_relaxed_extjson()
}

impl From<mongodb::error::Error> for StorageError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } => {
                StorageError::ConnectionError(err.to_string())
            }
            _ => StorageError::OperationError(err.to_string()),
        }
    }
}

impl From<mongodb::bson::ser::Error> for StorageError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> StorageResult<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let documents = documents
            .into_iter()
            .map(to_document)
            .collect::<StorageResult<Vec<_>>>()?;
        let result = self.collection(collection).insert_many(documents).await?;
        debug!(
            "Inserted {} documents into {}",
            result.inserted_ids.len(),
            collection
        );
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> StorageResult<()> {
        self.collection(collection).drop().await?;
        Ok(())
    }

    async fn rename(
        &self,
        source: &str,
        destination: &str,
        drop_target: bool,
    ) -> StorageResult<()> {
        let command = doc! {
            "renameCollection": self.namespace(source),
            "to": self.namespace(destination),
            "dropTarget": drop_target,
        };
        match self.client.database("admin").run_command(command).await {
            Ok(_) => Ok(()),
            Err(e) if error_code(&e) == Some(NAMESPACE_NOT_FOUND) => {
                Err(StorageError::NotFound(source.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn copy_all(&self, source: &str, destination: &str) -> StorageResult<()> {
        let pipeline = vec![doc! { "$match": {} }, doc! { "$out": destination }];
        let mut cursor = self.collection(source).aggregate(pipeline).await?;
        while cursor.advance().await? {}
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> StorageResult<Vec<Value>> {
        let documents: Vec<Document> = self
            .collection(collection)
            .find(doc! {})
            .await?
            .try_collect()
            .await?;
        Ok(documents.into_iter().map(to_value).collect())
    }

    async fn try_acquire_lease(&self, lease: &Lease) -> StorageResult<bool> {
        let now = Utc::now().timestamp_millis();
        let filter = doc! {
            "_id": LEASE_ID,
            "$or": [
                { "owner": &lease.owner },
                { "expires_at": { "$lte": now } },
            ],
        };
        let update = doc! {
            "$set": {
                "owner": &lease.owner,
                "expires_at": lease.expires_at.timestamp_millis(),
            }
        };

        let result = self
            .collection(&lease.name)
            .find_one_and_update(filter, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await;

        match result {
            Ok(_) => Ok(true),
            // A live lease held by someone else fails the filter, and the
            // upsert then collides on `_id`.
            Err(e) if error_code(&e) == Some(DUPLICATE_KEY) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn renew_lease(&self, lease: &Lease) -> StorageResult<bool> {
        let result = self
            .collection(&lease.name)
            .update_one(
                doc! { "_id": LEASE_ID, "owner": &lease.owner },
                doc! { "$set": { "expires_at": lease.expires_at.timestamp_millis() } },
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn release_lease(&self, name: &str, owner: &str) -> StorageResult<()> {
        self.collection(name)
            .delete_one(doc! { "_id": LEASE_ID, "owner": owner })
            .await?;
        Ok(())
    }
}
