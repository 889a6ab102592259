use async_trait::async_trait;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

#[cfg(test)]
use mockall::automock;

use crate::{
    db::{Database, ADMIN_USERS_COLLECTION},
    errors::AppResult,
    models::domain::AdminUser,
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    async fn find_by_azure_id(&self, azure_id: &str) -> AppResult<Option<AdminUser>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<AdminUser>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoAdminUserRepository {
    collection: Collection<AdminUser>,
}

impl MongoAdminUserRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(ADMIN_USERS_COLLECTION);
        Self { collection }
    }
}

#[async_trait]
impl AdminUserRepository for MongoAdminUserRepository {
    async fn find_by_azure_id(&self, azure_id: &str) -> AppResult<Option<AdminUser>> {
        let user = self
            .collection
            .find_one(doc! { "azure_id": azure_id })
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<AdminUser>> {
        let user = self.collection.find_one(doc! { "email": email }).await?;
        Ok(user)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        // Both identity fields are optional, hence sparse.
        let indexes = ["azure_id", "email"].into_iter().map(|field| {
            IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .sparse(true)
                        .name(format!("{}_unique", field))
                        .build(),
                )
                .build()
        });

        self.collection.create_indexes(indexes).await?;
        log::info!("Ensured indexes for {} collection", ADMIN_USERS_COLLECTION);

        Ok(())
    }
}
