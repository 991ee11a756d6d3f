use discover_db::DbPool;

/// Reports whether the content store is reachable.
#[derive(Debug, Clone)]
pub struct HealthUseCase {
    pool: DbPool,
}

impl HealthUseCase {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn check(&self) -> Result<(), sqlx::Error> {
        discover_db::health_check(&self.pool).await
    }
}
