use async_trait::async_trait;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::Permissions;

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn codes_for_user(&self, user_id: i64) -> Result<Permissions, DatabaseError>;
}

#[async_trait]
impl PermissionStore for PgStore {
    async fn codes_for_user(&self, user_id: i64) -> Result<Permissions, DatabaseError> {
        self.call(async {
            let codes: Vec<String> = sqlx::query_scalar(
                "SELECT p.code FROM permissions p \
                 INNER JOIN users_permissions up ON up.permission_id = p.id \
                 WHERE up.user_id = $1",
            )
            .bind(user_id)
            .fetch_all(self.pool())
            .await?;
            Ok::<_, DatabaseError>(Permissions::new(codes))
        })
        .await
    }
}
