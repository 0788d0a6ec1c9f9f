use crate::entities::chef_entity as chef;
use crate::error::AppResult;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

/// Read-only lookups of kitchen records. Onboarding writes them elsewhere.
#[derive(Clone)]
pub struct ChefService {
    pool: DatabaseConnection,
    platform_admin_chef_name: String,
}

impl ChefService {
    pub fn new(pool: DatabaseConnection, platform_admin_chef_name: String) -> Self {
        Self {
            pool,
            platform_admin_chef_name,
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<chef::Model>> {
        Ok(chef::Entity::find_by_id(id).one(&self.pool).await?)
    }

    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Option<chef::Model>> {
        Ok(chef::Entity::find()
            .filter(chef::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?)
    }

    /// Kitchen that aggregates orders for platform admins.
    pub async fn find_platform_admin(&self) -> AppResult<Option<chef::Model>> {
        Ok(chef::Entity::find()
            .filter(chef::Column::BusinessName.eq(self.platform_admin_chef_name.as_str()))
            .one(&self.pool)
            .await?)
    }
}
