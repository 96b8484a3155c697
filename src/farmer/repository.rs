//! Handle database requests.

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::database::Database;
use crate::farmer::cpf::Cpf;
use crate::farmer::error::{FarmerError, Result, ToStorage};
use crate::farmer::{Farmer, FarmerFilter, FarmerId, NewFarmer, UpdateFarmer};

const SELECT_FARMER: &str = r#"SELECT
        id, full_name, cpf, birth_date, phone, active, created_at, updated_at
    FROM farmers"#;

/// Port for farmer persistence.
#[async_trait]
pub trait FarmerRepository: Send + Sync {
    /// Find a farmer by its identifier.
    async fn find_by_id(&self, id: &FarmerId) -> Result<Option<Farmer>>;

    /// Find a farmer by its normalized CPF.
    async fn find_by_cpf(&self, cpf: &Cpf) -> Result<Option<Farmer>>;

    /// List farmers matching `filter`, sorted by full name.
    async fn find(&self, filter: &FarmerFilter) -> Result<Vec<Farmer>>;

    /// Insert a farmer.
    ///
    /// Returns [`FarmerError::DuplicateCpf`] when the storage unique
    /// constraint on CPF rejects the insert.
    async fn create(&self, farmer: &NewFarmer) -> Result<Farmer>;

    /// Apply mutable fields to an existing farmer.
    async fn update(&self, id: &FarmerId, farmer: &UpdateFarmer) -> Result<Farmer>;

    /// Physically remove a farmer.
    async fn delete(&self, id: &FarmerId) -> Result<()>;
}

/// PostgreSQL farmer repository.
#[derive(Clone)]
pub struct PgFarmerRepository {
    db: Database,
}

impl PgFarmerRepository {
    /// Create a new [`PgFarmerRepository`].
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FarmerRepository for PgFarmerRepository {
    async fn find_by_id(&self, id: &FarmerId) -> Result<Option<Farmer>> {
        let query = format!("{SELECT_FARMER} WHERE id = $1");

        sqlx::query_as::<_, Farmer>(&query)
            .bind(id)
            .fetch_optional(self.db.pool().await.catch()?)
            .await
            .catch()
    }

    async fn find_by_cpf(&self, cpf: &Cpf) -> Result<Option<Farmer>> {
        let query = format!("{SELECT_FARMER} WHERE cpf = $1");

        sqlx::query_as::<_, Farmer>(&query)
            .bind(cpf.as_str())
            .fetch_optional(self.db.pool().await.catch()?)
            .await
            .catch()
    }

    async fn find(&self, filter: &FarmerFilter) -> Result<Vec<Farmer>> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_FARMER);
        query.push(" WHERE TRUE");

        if let Some(name) = &filter.full_name {
            query
                .push(" AND full_name ILIKE ")
                .push_bind(format!("%{}%", escape_like(name)));
        }
        if let Some(cpf) = &filter.cpf {
            query.push(" AND cpf = ").push_bind(cpf.clone());
        }
        if let Some(active) = filter.active {
            query.push(" AND active = ").push_bind(active);
        }
        // byte order, same as the in-memory repository.
        query.push(" ORDER BY full_name COLLATE \"C\" ASC, id ASC");

        query
            .build_query_as::<Farmer>()
            .fetch_all(self.db.pool().await.catch()?)
            .await
            .catch()
    }

    async fn create(&self, farmer: &NewFarmer) -> Result<Farmer> {
        let query = r#"
            INSERT INTO farmers (full_name, cpf, birth_date, phone, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING
                id, full_name, cpf, birth_date, phone, active,
                created_at, updated_at
            "#;

        sqlx::query_as::<_, Farmer>(query)
            .bind(&farmer.full_name)
            .bind(farmer.cpf.as_str())
            .bind(farmer.birth_date)
            .bind(&farmer.phone)
            .bind(farmer.active)
            .fetch_one(self.db.pool().await.catch()?)
            .await
            .map_err(|err| match err.as_database_error() {
                Some(db_err) if db_err.is_unique_violation() => {
                    FarmerError::DuplicateCpf
                },
                _ => FarmerError::storage(err),
            })
    }

    async fn update(&self, id: &FarmerId, farmer: &UpdateFarmer) -> Result<Farmer> {
        let query = r#"
            UPDATE farmers
            SET
                full_name = $2,
                birth_date = $3,
                phone = $4,
                active = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, full_name, cpf, birth_date, phone, active,
                created_at, updated_at
            "#;

        sqlx::query_as::<_, Farmer>(query)
            .bind(id)
            .bind(&farmer.full_name)
            .bind(farmer.birth_date)
            .bind(&farmer.phone)
            .bind(farmer.active)
            .fetch_optional(self.db.pool().await.catch()?)
            .await
            .catch()?
            .ok_or(FarmerError::NotFound)
    }

    async fn delete(&self, id: &FarmerId) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM farmers WHERE id = $1"#)
            .bind(id)
            .execute(self.db.pool().await.catch()?)
            .await
            .catch()?;

        if result.rows_affected() == 0 {
            return Err(FarmerError::NotFound);
        }

        Ok(())
    }
}

/// Escape `LIKE` wildcards so user input is matched literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::farmer::cpf;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("Ana"), "Ana");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }

    fn repository(pool: PgPool) -> PgFarmerRepository {
        PgFarmerRepository::new(Database::from_pool(pool))
    }

    fn new_farmer(name: &str, raw_cpf: &str) -> NewFarmer {
        NewFarmer {
            full_name: name.into(),
            cpf: cpf::assert_valid(raw_cpf).unwrap(),
            birth_date: None,
            phone: None,
            active: true,
        }
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL instance in DATABASE_URL"]
    async fn test_unique_cpf_index(pool: PgPool) {
        let repo = repository(pool);

        repo.create(&new_farmer("Ana Souza", "93541134780")).await.unwrap();
        let err = repo
            .create(&new_farmer("Ana Clone", "935.411.347-80"))
            .await
            .unwrap_err();
        assert!(matches!(err, FarmerError::DuplicateCpf));
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL instance in DATABASE_URL"]
    async fn test_find_sorted_and_filtered(pool: PgPool) {
        let repo = repository(pool);

        repo.create(&new_farmer("Carlos Lima", "52998224725")).await.unwrap();
        repo.create(&new_farmer("Ana 100% Souza", "93541134780")).await.unwrap();
        repo.create(&new_farmer("Bruno Alves", "11144477735")).await.unwrap();
        repo.create(&new_farmer("bruno lima", "12345678909")).await.unwrap();

        let all = repo.find(&FarmerFilter::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|f| f.full_name.as_str()).collect();
        assert_eq!(
            names,
            ["Ana 100% Souza", "Bruno Alves", "Carlos Lima", "bruno lima"]
        );

        let filter = FarmerFilter {
            full_name: Some("100%".into()),
            ..Default::default()
        };
        let found = repo.find(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].cpf, "93541134780");
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL instance in DATABASE_URL"]
    async fn test_update_and_delete(pool: PgPool) {
        let repo = repository(pool);

        let farmer =
            repo.create(&new_farmer("Ana Souza", "93541134780")).await.unwrap();
        let changes = UpdateFarmer {
            full_name: "Ana Souza Lima".into(),
            active: false,
            ..Default::default()
        };
        let updated = repo.update(&farmer.id, &changes).await.unwrap();
        assert_eq!(updated.cpf, farmer.cpf);
        assert!(!updated.active);
        assert!(updated.updated_at >= farmer.updated_at);

        repo.delete(&farmer.id).await.unwrap();
        assert!(repo.find_by_id(&farmer.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&farmer.id).await,
            Err(FarmerError::NotFound)
        ));
    }
}
