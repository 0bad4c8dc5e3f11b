//! External-database lease store
//!
//! SeaORM-backed implementation over the `latch_lease` table. The bulk
//! expiry purge is a conditional `DELETE WHERE expires_at < now` executed at
//! the database, so a row renewed after selection survives the sweep.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};

use crate::model::{Lease, LeaseHolder, LeaseKey};

use super::LeaseStore;
use super::entity::lease;

/// Lease store backed by an external database (MySQL/PostgreSQL)
#[derive(Clone)]
pub struct DbLeaseStore {
    db: DatabaseConnection,
}

impl DbLeaseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_lease(model: lease::Model) -> Lease {
    Lease {
        resource_type: model.resource_type,
        resource_id: model.resource_id,
        holder: LeaseHolder {
            id: model.holder_id,
            name: model.holder_name,
            email: model.holder_email,
        },
        expires_at: model.expires_at,
    }
}

#[async_trait]
impl LeaseStore for DbLeaseStore {
    async fn get(&self, key: &LeaseKey) -> anyhow::Result<Option<Lease>> {
        let model = lease::Entity::find_by_id(key.storage_key())
            .one(&self.db)
            .await?;
        Ok(model.map(to_lease))
    }

    async fn upsert(&self, lease_record: &Lease) -> anyhow::Result<()> {
        let existing = lease::Entity::find_by_id(lease_record.storage_key())
            .one(&self.db)
            .await?;

        if let Some(model) = existing {
            let mut active: lease::ActiveModel = model.into();
            active.holder_id = Set(lease_record.holder.id.clone());
            active.holder_name = Set(lease_record.holder.name.clone());
            active.holder_email = Set(lease_record.holder.email.clone());
            active.expires_at = Set(lease_record.expires_at);
            active.update(&self.db).await?;
        } else {
            let active = lease::ActiveModel {
                id: Set(lease_record.storage_key()),
                resource_type: Set(lease_record.resource_type.clone()),
                resource_id: Set(lease_record.resource_id.clone()),
                holder_id: Set(lease_record.holder.id.clone()),
                holder_name: Set(lease_record.holder.name.clone()),
                holder_email: Set(lease_record.holder.email.clone()),
                expires_at: Set(lease_record.expires_at),
            };
            lease::Entity::insert(active).exec(&self.db).await?;
        }
        Ok(())
    }

    async fn delete(&self, key: &LeaseKey) -> anyhow::Result<()> {
        lease::Entity::delete_many()
            .filter(lease::Column::Id.eq(key.storage_key()))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn update_expiry(&self, key: &LeaseKey, expires_at: DateTime<Utc>) -> anyhow::Result<()> {
        lease::Entity::update_many()
            .col_expr(lease::Column::ExpiresAt, Expr::value(expires_at))
            .filter(lease::Column::Id.eq(key.storage_key()))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn list(
        &self,
        resource_type: &str,
        resource_id: Option<&str>,
        unexpired_only: bool,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Lease>> {
        let mut query =
            lease::Entity::find().filter(lease::Column::ResourceType.eq(resource_type));
        if let Some(id) = resource_id {
            query = query.filter(lease::Column::ResourceId.eq(id));
        }
        if unexpired_only {
            query = query.filter(lease::Column::ExpiresAt.gt(now));
        }

        let models = query.all(&self.db).await?;
        Ok(models.into_iter().map(to_lease).collect())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = lease::Entity::delete_many()
            .filter(lease::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
