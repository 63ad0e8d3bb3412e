pub mod error;
pub mod login;
pub mod npmrc;

pub use error::NpmrcAccountError;
