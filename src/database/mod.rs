pub mod postgres;
pub mod row;
pub mod store;

pub use postgres::PgCredentialStore;
pub use row::{Cell, DecodedRow, Field};
pub use store::{CredentialStore, OutputShape, Param, Procedure, ProcedureCall, RawResult, StoreError};
