// ==========================================
// Portal de Propostas - Erros da camada de API
// ==========================================
// Responsabilidade: converter erros de repositório/engine em erros
// amigáveis para a interface, sem perder o detalhe estruturado
// ==========================================

use crate::engine::error::{EngineError, FieldViolation};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// Erros da camada de API
/// Toda mensagem carrega causa explícita (renderização campo a campo)
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // Erros de entrada do usuário
    // ==========================================
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    /// Validação com detalhe por campo
    #[error("Falha de validação: {reason}")]
    ValidationError {
        reason: String,
        violations: Vec<FieldViolation>,
    },

    // ==========================================
    // Erros de negócio
    // ==========================================
    #[error("Recurso não encontrado: {0}")]
    NotFound(String),

    #[error("Falha de catálogo: {0}")]
    CatalogError(String),

    #[error("Fórmula inválida: {0}")]
    FormulaError(String),

    // ==========================================
    // Erros de orquestração
    // ==========================================
    #[error("Cálculo excedeu o tempo máximo; tente novamente: {0}")]
    ComputationTimeout(String),

    // ==========================================
    // Erros de acesso a dados
    // ==========================================
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(String),

    // ==========================================
    // Erros genéricos
    // ==========================================
    #[error("Erro interno: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// Conversão de RepositoryError
// Objetivo: erro técnico -> erro de negócio amigável
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={}) não existe", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::LockError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::InvalidInput(format!("violação de unicidade: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::InvalidInput(format!("violação de integridade: {}", msg))
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::InvalidInput(msg),
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("campo {}: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// Conversão de EngineError
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation { violations } => ApiError::ValidationError {
                reason: format!("{} campo(s) inválido(s)", violations.len()),
                violations,
            },
            EngineError::CatalogLookup { code, message } => {
                ApiError::CatalogError(format!("produto={}: {}", code, message))
            }
            EngineError::Formula { formula, message } => {
                ApiError::FormulaError(format!("\"{}\": {}", formula, message))
            }
            EngineError::Timeout { timeout_ms } => {
                ApiError::ComputationTimeout(format!("{}ms", timeout_ms))
            }
            EngineError::Cancelled => {
                ApiError::InternalError("cálculo cancelado sem supersessão".to_string())
            }
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={}) não existe", entity, id))
            }
            EngineError::Storage(msg) => ApiError::DatabaseError(msg),
            EngineError::Config(msg) => ApiError::InternalError(format!("configuração: {}", msg)),
            EngineError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Alias de Result da camada
pub type ApiResult<T> = Result<T, ApiError>;
