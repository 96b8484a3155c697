use std::sync::Arc;

use crate::farmer::error::{FarmerError, Result};
use crate::farmer::{
    CreateFarmer, Farmer, FarmerFilter, FarmerId, FarmerRepository, NewFarmer,
    UpdateFarmer, cpf, full_name, phone_number, policy,
};

/// Farmer manager.
///
/// Every check that can be made without storage runs before the
/// repository is called.
#[derive(Clone)]
pub struct FarmerService {
    repo: Arc<dyn FarmerRepository>,
}

impl FarmerService {
    /// Create a new [`FarmerService`].
    pub fn new(repo: Arc<dyn FarmerRepository>) -> Self {
        Self { repo }
    }

    /// List farmers sorted by full name.
    pub async fn list(&self, filter: &FarmerFilter) -> Result<Vec<Farmer>> {
        self.repo.find(filter).await
    }

    /// Find a farmer using its raw identifier.
    pub async fn get(&self, id: &str) -> Result<Farmer> {
        let id = FarmerId::parse(id)?;

        self.repo.find_by_id(&id).await?.ok_or(FarmerError::NotFound)
    }

    /// Create a farmer with an unused CPF.
    ///
    /// The existence check is a fast path only: two concurrent creations
    /// can both pass it, and the storage unique index settles the race.
    pub async fn create(&self, request: CreateFarmer) -> Result<Farmer> {
        let full_name = full_name(&request.full_name)?;
        let cpf = cpf::assert_valid(&request.cpf)?;
        let phone = phone_number(request.phone.as_deref())?;

        if self.repo.find_by_cpf(&cpf).await?.is_some() {
            return Err(FarmerError::DuplicateCpf);
        }

        let farmer = self
            .repo
            .create(&NewFarmer {
                full_name,
                cpf,
                birth_date: request.birth_date,
                phone,
                active: request.active.unwrap_or(true),
            })
            .await?;

        metrics::counter!("farmers_created_total").increment(1);
        tracing::info!(farmer_id = %farmer.id, "farmer created");

        Ok(farmer)
    }

    /// Update every mutable field of a farmer. CPF is never touched.
    pub async fn update(&self, id: &str, request: UpdateFarmer) -> Result<Farmer> {
        let id = FarmerId::parse(id)?;
        let changes = UpdateFarmer {
            full_name: full_name(&request.full_name)?,
            phone: phone_number(request.phone.as_deref())?,
            ..request
        };

        if self.repo.find_by_id(&id).await?.is_none() {
            return Err(FarmerError::NotFound);
        }

        let farmer = self.repo.update(&id, &changes).await?;
        tracing::debug!(farmer_id = %farmer.id, active = farmer.active, "farmer updated");

        Ok(farmer)
    }

    /// Remove an inactive farmer.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = FarmerId::parse(id)?;

        let farmer =
            self.repo.find_by_id(&id).await?.ok_or(FarmerError::NotFound)?;
        policy::ensure_deletable(farmer.active)?;

        self.repo.delete(&id).await?;

        metrics::counter!("farmers_deleted_total").increment(1);
        tracing::info!(farmer_id = %id, "farmer removed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::farmer::memory::InMemoryFarmerRepository;

    fn service() -> (FarmerService, Arc<InMemoryFarmerRepository>) {
        let repo = Arc::new(InMemoryFarmerRepository::default());
        (FarmerService::new(repo.clone()), repo)
    }

    fn request(name: &str, cpf: &str) -> CreateFarmer {
        CreateFarmer {
            full_name: name.into(),
            cpf: cpf.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_fields() {
        let (service, _) = service();

        let farmer = service
            .create(CreateFarmer {
                full_name: "  Ana Souza ".into(),
                cpf: "935.411.347-80".into(),
                birth_date: NaiveDate::from_ymd_opt(1985, 4, 12),
                phone: Some("(11) 98765-4321".into()),
                active: None,
            })
            .await
            .unwrap();

        assert_eq!(farmer.full_name, "Ana Souza");
        assert_eq!(farmer.cpf, "93541134780");
        assert_eq!(farmer.phone.as_deref(), Some("11987654321"));
        assert!(farmer.active);
    }

    #[tokio::test]
    async fn test_create_rejects_before_storage() {
        let (service, repo) = service();

        let err = service.create(request("Ana", "123.456.789-00")).await;
        assert!(matches!(err, Err(FarmerError::InvalidCpf)));

        let err = service.create(request(" A ", "93541134780")).await;
        assert!(matches!(err, Err(FarmerError::InvalidFullName { .. })));

        let err = service
            .create(CreateFarmer {
                phone: Some("+55 (11) 98765-4321".into()),
                ..request("Ana Souza", "93541134780")
            })
            .await;
        assert!(matches!(err, Err(FarmerError::InvalidPhone { max: 11 })));

        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_create_duplicate_cpf() {
        let (service, _) = service();

        service.create(request("Ana Souza", "93541134780")).await.unwrap();
        let err = service.create(request("Ana Lima", "935.411.347-80")).await;
        assert!(matches!(err, Err(FarmerError::DuplicateCpf)));
    }

    #[tokio::test]
    async fn test_update_keeps_cpf() {
        let (service, _) = service();
        let farmer =
            service.create(request("Ana Souza", "93541134780")).await.unwrap();

        let updated = service
            .update(
                &farmer.id.to_string(),
                UpdateFarmer {
                    full_name: "Ana Souza Lima ".into(),
                    birth_date: None,
                    phone: Some("  ".into()),
                    active: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.cpf, farmer.cpf);
        assert_eq!(updated.full_name, "Ana Souza Lima");
        assert_eq!(updated.phone, None);
        assert!(!updated.active);
    }

    #[tokio::test]
    async fn test_delete_requires_inactive() {
        let (service, _) = service();
        let farmer =
            service.create(request("Ana Souza", "93541134780")).await.unwrap();
        let id = farmer.id.to_string();

        let err = service.delete(&id).await;
        assert!(matches!(err, Err(FarmerError::ActiveFarmer)));

        service
            .update(
                &id,
                UpdateFarmer {
                    full_name: farmer.full_name,
                    active: false,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        service.delete(&id).await.unwrap();

        assert!(matches!(service.get(&id).await, Err(FarmerError::NotFound)));
    }

    #[tokio::test]
    async fn test_invalid_identifier_never_reaches_storage() {
        let (service, repo) = service();

        assert!(matches!(
            service.get("not-an-id").await,
            Err(FarmerError::InvalidIdentifier)
        ));
        assert!(matches!(
            service.delete("42").await,
            Err(FarmerError::InvalidIdentifier)
        ));
        assert_eq!(repo.calls(), 0);
    }
}
