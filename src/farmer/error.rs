//! Custom error handler for farmer records.

pub type Result<T> = std::result::Result<T, FarmerError>;

/// Enum representing farmer domain errors.
#[derive(Debug, thiserror::Error)]
pub enum FarmerError {
    #[error("invalid CPF")]
    InvalidCpf,
    #[error("full name must contain at least {min} characters")]
    InvalidFullName { min: usize },
    #[error("invalid birth date")]
    InvalidBirthDate,
    #[error("phone must contain at most {max} digits")]
    InvalidPhone { max: usize },
    #[error("invalid identifier")]
    InvalidIdentifier,

    #[error("farmer not found")]
    NotFound,
    #[error("CPF already registered")]
    DuplicateCpf,
    #[error("active farmer cannot be deleted")]
    ActiveFarmer,

    #[error("storage failure")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FarmerError {
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }
}

/// Turn any storage-level error into [`FarmerError::Storage`].
pub trait ToStorage<T> {
    fn catch(self) -> Result<T>;
}

impl<T, E> ToStorage<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn catch(self) -> Result<T> {
        self.map_err(FarmerError::storage)
    }
}
