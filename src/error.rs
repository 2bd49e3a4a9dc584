use thiserror::Error;

use crate::eval::error::EvalError;
use crate::geometry::CoordsError;
use crate::value::ValueError;

#[derive(Error, Debug)]
pub enum Error {
    // evaluation
    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),
    // value model
    #[error("Value error: {0}")]
    Value(#[from] ValueError),
    #[error("Coords error: {0}")]
    Coords(#[from] CoordsError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InternalResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
