use ecu_common::CommonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan failed: {0}")]
    Scan(#[from] CommonError),
}

pub type GraphResult<T> = Result<T, GraphError>;
