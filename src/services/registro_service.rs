use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::api::format::{normalize_rows, NormalizedRecord};
use crate::auth::{Subject, TokenService};
use crate::database::{Cell, CredentialStore, DecodedRow, ProcedureCall, RawResult, StoreError};
use crate::error::ApiError;
use crate::middleware::{Confirmation, TokenResponse};
use crate::validation::{self, SchemaKind};

const LOGIN_FAILED: &str = "Error al verificar las credenciales";
const LIST_FAILED: &str = "Error al obtener registros";
const CREATE_FAILED: &str = "Error al agregar el registro";
const UPDATE_FAILED: &str = "Error al actualizar el registro";
const DELETE_FAILED: &str = "Error al eliminar el registro";

pub const CREATED: &str = "Registro agregado con éxito";
pub const UPDATED: &str = "Registro actualizado con éxito";
pub const DELETED: &str = "Registro eliminado con éxito";

/// Per-operation pipeline: validate, invoke one stored procedure, normalize, shape.
///
/// Validation failures never reach the store. Store failures never escape as anything but a
/// generic message; the detail is logged here.
#[derive(Clone)]
pub struct RegistroService {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
}

impl RegistroService {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    pub async fn login(&self, body: &Value) -> Result<TokenResponse, ApiError> {
        let credentials = validation::validate_login(body)?;

        let rows = self.rows(ProcedureCall::login(&credentials), LOGIN_FAILED).await?;
        let Some(row) = rows.into_iter().next() else {
            info!("Login rejected for {}", credentials.email);
            return Err(ApiError::InvalidCredentials);
        };

        let subject = subject_from(&row).map_err(|e| backend_failure(e, LOGIN_FAILED))?;
        let token = self.tokens.issue(subject)?;

        info!("Issued token for user {}", subject);
        Ok(TokenResponse { token })
    }

    pub async fn list(&self) -> Result<Vec<NormalizedRecord>, ApiError> {
        let rows = self.rows(ProcedureCall::list(), LIST_FAILED).await?;
        Ok(normalize_rows(rows))
    }

    pub async fn create(&self, body: &Value) -> Result<Confirmation, ApiError> {
        let record = validation::validate_user(SchemaKind::Create, body)?;
        self.write(ProcedureCall::create(&record), CREATE_FAILED).await?;
        info!("Created record {}", record.id);
        Ok(Confirmation::new(CREATED))
    }

    /// Updates by the body's `id`; the caller's path id is not consulted.
    pub async fn update(&self, body: &Value) -> Result<Confirmation, ApiError> {
        let record = validation::validate_user(SchemaKind::Update, body)?;
        self.write(ProcedureCall::update(&record), UPDATE_FAILED).await?;
        info!("Updated record {}", record.id);
        Ok(Confirmation::new(UPDATED))
    }

    pub async fn delete(&self, id: i64) -> Result<Confirmation, ApiError> {
        self.write(ProcedureCall::delete(id), DELETE_FAILED).await?;
        info!("Deleted record {}", id);
        Ok(Confirmation::new(DELETED))
    }

    async fn rows(&self, call: ProcedureCall, failure: &'static str) -> Result<Vec<DecodedRow>, ApiError> {
        let procedure = call.procedure.name();
        match self.store.call(call).await {
            Ok(RawResult::Rows(rows)) => Ok(rows),
            Ok(RawResult::Committed) => Err(backend_failure(
                StoreError::UnexpectedOutput {
                    procedure,
                    detail: "expected a cursor, got none".to_string(),
                },
                failure,
            )),
            Err(e) => Err(backend_failure(e, failure)),
        }
    }

    async fn write(&self, call: ProcedureCall, failure: &'static str) -> Result<(), ApiError> {
        let procedure = call.procedure.name();
        match self.store.call(call).await {
            Ok(RawResult::Committed) => Ok(()),
            Ok(RawResult::Rows(_)) => Err(backend_failure(
                StoreError::UnexpectedOutput {
                    procedure,
                    detail: "write procedure returned rows".to_string(),
                },
                failure,
            )),
            Err(e) => Err(backend_failure(e, failure)),
        }
    }
}

fn backend_failure(err: StoreError, message: &'static str) -> ApiError {
    error!("{}: {}", message, err);
    ApiError::internal_server_error(message)
}

/// The login cursor yields the identifier in an `id` column, or else in its first column.
fn subject_from(row: &DecodedRow) -> Result<Subject, StoreError> {
    let unexpected = |detail: String| StoreError::UnexpectedOutput {
        procedure: "sp_login_user",
        detail,
    };

    match row.get("id").or_else(|| row.first_value()) {
        Some(Cell::Integer(id)) => Ok(Subject(*id)),
        Some(Cell::Text(text)) => text
            .trim()
            .parse()
            .map(Subject)
            .map_err(|_| unexpected(format!("non-numeric identifier {:?}", text))),
        Some(other) => Err(unexpected(format!("unsupported identifier {:?}", other))),
        None => Err(unexpected("empty row".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_comes_from_id_column() {
        let row = DecodedRow::from_pairs([
            ("NOMBRE", Cell::Text("ana".to_string())),
            ("ID", Cell::Integer(12)),
        ]);
        assert_eq!(subject_from(&row).unwrap(), Subject(12));
    }

    #[test]
    fn subject_falls_back_to_sole_column() {
        let row = DecodedRow::from_pairs([("ID_USUARIO", Cell::Integer(4))]);
        assert_eq!(subject_from(&row).unwrap(), Subject(4));
    }

    #[test]
    fn subject_falls_back_to_first_column() {
        let row = DecodedRow::from_pairs([
            ("ID_USUARIO", Cell::Integer(4)),
            ("NOMBRE", Cell::Text("ana".to_string())),
        ]);
        assert_eq!(subject_from(&row).unwrap(), Subject(4));
    }

    #[test]
    fn numeric_text_identifiers_are_accepted() {
        let row = DecodedRow::from_pairs([("ID", Cell::Text(" 8 ".to_string()))]);
        assert_eq!(subject_from(&row).unwrap(), Subject(8));
    }

    #[test]
    fn unusable_identifiers_are_backend_errors() {
        let row = DecodedRow::from_pairs([("ID", Cell::Bool(true))]);
        assert!(matches!(subject_from(&row), Err(StoreError::UnexpectedOutput { .. })));

        let row = DecodedRow::from_pairs([
            ("NOMBRE", Cell::Text("ana".to_string())),
            ("ID_USUARIO", Cell::Integer(2)),
        ]);
        assert!(matches!(subject_from(&row), Err(StoreError::UnexpectedOutput { .. })));

        let empty = DecodedRow::default();
        assert!(matches!(subject_from(&empty), Err(StoreError::UnexpectedOutput { .. })));
    }
}
