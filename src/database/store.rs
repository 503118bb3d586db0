use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use super::row::DecodedRow;
use crate::validation::{LoginCredentials, UserRecord};

/// Name of the refcursor that cursor-bearing procedures open.
pub const CURSOR_NAME: &str = "result_cursor";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to backend: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("procedure {procedure} failed: {source}")]
    Procedure {
        procedure: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("procedure {procedure} returned unexpected output: {detail}")]
    UnexpectedOutput { procedure: &'static str, detail: String },
}

/// What a procedure hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// Side effect only, auto-committed.
    Nothing,
    /// Rows delivered through [`CURSOR_NAME`].
    Cursor,
}

/// The stored procedures the gateway is allowed to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Procedure {
    LoginUser,
    GetRegistros,
    InsertarUsuario,
    ActualizarUsuario,
    EliminarUsuario,
}

impl Procedure {
    pub fn name(self) -> &'static str {
        match self {
            Procedure::LoginUser => "sp_login_user",
            Procedure::GetRegistros => "get_registros",
            Procedure::InsertarUsuario => "insertar_usuario",
            Procedure::ActualizarUsuario => "actualizar_usuario",
            Procedure::EliminarUsuario => "eliminar_usuario",
        }
    }

    pub fn output(self) -> OutputShape {
        match self {
            Procedure::LoginUser | Procedure::GetRegistros => OutputShape::Cursor,
            _ => OutputShape::Nothing,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Param {
    Int(i64),
    Text(String),
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Int(v) => write!(f, "Int({})", v),
            // bound text may be a password
            Param::Text(v) => write!(f, "Text(<{} chars>)", v.chars().count()),
        }
    }
}

/// One stored-procedure invocation with its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureCall {
    pub procedure: Procedure,
    pub params: Vec<Param>,
}

impl ProcedureCall {
    pub fn login(credentials: &LoginCredentials) -> Self {
        Self {
            procedure: Procedure::LoginUser,
            params: vec![
                Param::Text(credentials.email.clone()),
                Param::Text(credentials.password.clone()),
            ],
        }
    }

    pub fn list() -> Self {
        Self {
            procedure: Procedure::GetRegistros,
            params: Vec::new(),
        }
    }

    pub fn create(record: &UserRecord) -> Self {
        Self::write(Procedure::InsertarUsuario, record)
    }

    pub fn update(record: &UserRecord) -> Self {
        Self::write(Procedure::ActualizarUsuario, record)
    }

    pub fn delete(id: i64) -> Self {
        Self {
            procedure: Procedure::EliminarUsuario,
            params: vec![Param::Int(id)],
        }
    }

    fn write(procedure: Procedure, record: &UserRecord) -> Self {
        Self {
            procedure,
            params: vec![
                Param::Int(record.id),
                Param::Text(record.first_name.clone()),
                Param::Text(record.last_name.clone()),
                Param::Text(record.email.clone()),
                Param::Text(record.password.clone()),
            ],
        }
    }

    pub fn output(&self) -> OutputShape {
        self.procedure.output()
    }

    /// `CALL name($1, ..., $n)`, with the cursor name appended for cursor procedures.
    pub fn statement(&self) -> String {
        let mut args: Vec<String> = (1..=self.params.len()).map(|i| format!("${}", i)).collect();
        if self.output() == OutputShape::Cursor {
            args.push(format!("'{}'", CURSOR_NAME));
        }
        format!("CALL {}({})", self.procedure.name(), args.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    Committed,
    Rows(Vec<DecodedRow>),
}

/// The relational backend, reachable only through stored procedures.
///
/// Implementations acquire a connection per call and release it before returning.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn call(&self, call: ProcedureCall) -> Result<RawResult, StoreError>;

    /// Cheap connectivity probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
