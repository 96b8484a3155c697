//! In-memory farmer repository used by tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::farmer::cpf::Cpf;
use crate::farmer::error::{FarmerError, Result};
use crate::farmer::{
    Farmer, FarmerFilter, FarmerId, FarmerRepository, NewFarmer, UpdateFarmer,
};

/// Repository storing farmers in a vector, with the same CPF uniqueness
/// constraint as the PostgreSQL schema.
#[derive(Default)]
pub struct InMemoryFarmerRepository {
    farmers: RwLock<Vec<Farmer>>,
    calls: AtomicUsize,
    failing: bool,
}

impl InMemoryFarmerRepository {
    /// Repository whose every call fails with a storage error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn hit(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing {
            return Err(FarmerError::storage(std::io::Error::other(
                "connection reset by peer",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl FarmerRepository for InMemoryFarmerRepository {
    async fn find_by_id(&self, id: &FarmerId) -> Result<Option<Farmer>> {
        self.hit()?;
        let farmers = self.farmers.read().await;
        Ok(farmers.iter().find(|f| &f.id == id).cloned())
    }

    async fn find_by_cpf(&self, cpf: &Cpf) -> Result<Option<Farmer>> {
        self.hit()?;
        let farmers = self.farmers.read().await;
        Ok(farmers.iter().find(|f| f.cpf == cpf.as_str()).cloned())
    }

    async fn find(&self, filter: &FarmerFilter) -> Result<Vec<Farmer>> {
        self.hit()?;
        let mut found: Vec<Farmer> = self
            .farmers
            .read()
            .await
            .iter()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        // byte order, as `COLLATE "C"` in PostgreSQL.
        found.sort_by(|a, b| {
            a.full_name
                .as_bytes()
                .cmp(b.full_name.as_bytes())
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        Ok(found)
    }

    async fn create(&self, farmer: &NewFarmer) -> Result<Farmer> {
        self.hit()?;
        let mut farmers = self.farmers.write().await;
        if farmers.iter().any(|f| f.cpf == farmer.cpf.as_str()) {
            return Err(FarmerError::DuplicateCpf);
        }

        let now = Utc::now();
        let farmer = Farmer {
            id: FarmerId::generate(),
            full_name: farmer.full_name.clone(),
            cpf: farmer.cpf.to_string(),
            birth_date: farmer.birth_date,
            phone: farmer.phone.clone(),
            active: farmer.active,
            created_at: now,
            updated_at: now,
        };
        farmers.push(farmer.clone());
        Ok(farmer)
    }

    async fn update(&self, id: &FarmerId, changes: &UpdateFarmer) -> Result<Farmer> {
        self.hit()?;
        let mut farmers = self.farmers.write().await;
        let farmer = farmers
            .iter_mut()
            .find(|f| &f.id == id)
            .ok_or(FarmerError::NotFound)?;

        farmer.full_name = changes.full_name.clone();
        farmer.birth_date = changes.birth_date;
        farmer.phone = changes.phone.clone();
        farmer.active = changes.active;
        farmer.updated_at = Utc::now();
        Ok(farmer.clone())
    }

    async fn delete(&self, id: &FarmerId) -> Result<()> {
        self.hit()?;
        let mut farmers = self.farmers.write().await;
        let len = farmers.len();
        farmers.retain(|f| &f.id != id);
        if farmers.len() == len {
            return Err(FarmerError::NotFound);
        }
        Ok(())
    }
}
