use kiln_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to snapshot form definition: {0}")]
    Template(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, SaveError>;
