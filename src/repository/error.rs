// ==========================================
// Portal de Propostas - Erros da camada de repositórios
// ==========================================
// Ferramenta: macro derive do thiserror
// ==========================================

use thiserror::Error;

/// Erros da camada de repositórios
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== Erros de banco de dados =====
    #[error("Registro não encontrado: {entity} com id={id}")]
    NotFound { entity: String, id: String },

    #[error("Falha de conexão com o banco: {0}")]
    DatabaseConnectionError(String),

    #[error("Falha ao obter lock do banco: {0}")]
    LockError(String),

    #[error("Falha de transação no banco: {0}")]
    DatabaseTransactionError(String),

    #[error("Falha de consulta no banco: {0}")]
    DatabaseQueryError(String),

    #[error("Violação de restrição de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Violação de chave estrangeira: {0}")]
    ForeignKeyViolation(String),

    // ===== Erros de regra de negócio =====
    #[error("Violação de regra de negócio: {0}")]
    BusinessRuleViolation(String),

    // ===== Erros de qualidade de dados =====
    #[error("Falha de validação de dados: {0}")]
    ValidationError(String),

    #[error("Valor de campo inválido (campo={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== Erros genéricos =====
    #[error("Erro interno: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// Conversão de rusqlite::Error
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Alias de Result da camada
pub type RepositoryResult<T> = Result<T, RepositoryError>;
