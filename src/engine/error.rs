// ==========================================
// Portal de Propostas - Erros da camada de engine
// ==========================================
// Regra: todo erro carrega tipo + mensagem + campo/código ofensor,
// para a interface renderizar detalhe por campo ou por item
// Regra: Clone obrigatório - o single-flight distribui o mesmo erro
// para todos os chamadores em espera
// ==========================================

use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// FieldViolation - Violação de campo
// ==========================================
// Uso: validação acumula todas as violações antes de falhar, para a
// interface exibir todos os problemas de uma vez
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

// ==========================================
// EngineError
// ==========================================
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    // ===== Entrada do usuário =====
    #[error("Falha de validação: {}", join_violations(.violations))]
    Validation { violations: Vec<FieldViolation> },

    // ===== Catálogo =====
    #[error("Falha de consulta ao catálogo: produto={code}: {message}")]
    CatalogLookup { code: String, message: String },

    // ===== Fórmula customizada =====
    #[error("Fórmula inválida: \"{formula}\": {message}")]
    Formula { formula: String, message: String },

    // ===== Orquestração =====
    #[error("Tempo de cálculo excedido ({timeout_ms}ms); tente novamente")]
    Timeout { timeout_ms: u64 },

    #[error("Cálculo cancelado por um pedido mais recente")]
    Cancelled,

    // ===== Persistência =====
    #[error("Registro não encontrado: {entity} com id={id}")]
    NotFound { entity: String, id: String },

    #[error("Falha de armazenamento: {0}")]
    Storage(String),

    // ===== Configuração =====
    #[error("Falha de configuração: {0}")]
    Config(String),

    // ===== Genérico =====
    #[error("Erro interno: {0}")]
    Internal(String),
}

impl EngineError {
    /// Constrói um erro de validação a partir das violações acumuladas
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        EngineError::Validation { violations }
    }

    /// Constrói um erro de catálogo preservando o código ofensor
    pub fn catalog(code: &str, source: RepositoryError) -> Self {
        EngineError::CatalogLookup {
            code: code.to_string(),
            message: source.to_string(),
        }
    }

    /// Constrói um erro de fórmula preservando o texto ofensor
    pub fn formula(formula: &str, message: impl Into<String>) -> Self {
        EngineError::Formula {
            formula: formula.to_string(),
            message: message.into(),
        }
    }

    /// Campos violados (vazio para erros que não são de validação)
    pub fn violated_fields(&self) -> Vec<&str> {
        match self {
            EngineError::Validation { violations } => {
                violations.iter().map(|v| v.field.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

// Conversão da camada de repositórios
// Objetivo: rebaixar falhas técnicas para tipos estruturados do engine
impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            RepositoryError::FieldValueError { field, message } => EngineError::Validation {
                violations: vec![FieldViolation { field, message }],
            },
            RepositoryError::ValidationError(msg) => EngineError::Validation {
                violations: vec![FieldViolation::new("-", msg)],
            },
            other => EngineError::Storage(other.to_string()),
        }
    }
}

/// Alias de Result da camada
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_field() {
        let err = EngineError::validation(vec![
            FieldViolation::new("area_telhado", "deve ser maior que zero"),
            FieldViolation::new("fator_correcao", "fora do intervalo [0.1, 10]"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("area_telhado"));
        assert!(msg.contains("fator_correcao"));
        assert_eq!(err.violated_fields(), vec!["area_telhado", "fator_correcao"]);
    }

    #[test]
    fn test_repository_not_found_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "ProductRecord".to_string(),
            id: "OSB-11".to_string(),
        };
        let engine_err: EngineError = repo_err.into();
        assert!(matches!(engine_err, EngineError::NotFound { .. }));
    }
}
