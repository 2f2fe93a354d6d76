// ==========================================
// Portal de Propostas - Biblioteca central
// ==========================================
// Escopo: motor de composição e orçamento quantitativo
// Stack: Rust + SQLite
// Posição no sistema: camada de cálculo consumida pelos
// assistentes de proposta e pelas telas administrativas
// ==========================================

// Inicialização do sistema de internacionalização
rust_i18n::i18n!("locales", fallback = "pt-BR");

// ==========================================
// Declaração de módulos
// ==========================================

// Camada de domínio - entidades e tipos
pub mod domain;

// Camada de repositórios - acesso a dados
pub mod repository;

// Camada de engine - regras de negócio
pub mod engine;

// Camada de configuração
pub mod config;

// Infraestrutura de banco (inicialização de conexão / PRAGMA unificado)
pub mod db;

// Sistema de logs
pub mod logging;

// Internacionalização
pub mod i18n;

// Camada de API - interface de negócio
pub mod api;

// ==========================================
// Reexportação de tipos centrais
// ==========================================

// Tipos de domínio
pub use domain::types::{CalculationMode, DimensionBasis};

// Entidades de domínio
pub use domain::{
    CalculationRequest, Composition, CompositionLineItem, ComputationWarning, LineItemInput,
    LineItemPatch, ProductRecord, QuantitativeItem, QuantitativeOutput,
};

// Engines
pub use engine::{
    compute_line_value, CompositionAggregator, ComputeOutcome, ComputeResponse, EngineError,
    EngineResult, FieldViolation, FormulaEvaluator, LineValue, OrchestratorSettings,
    QuantitativePipeline, RequestOrchestrator,
};

// Configuração
pub use config::{ConfigManager, EngineConfigReader, MaterialRule, SystemDefinition, SystemRegistry};

// API
pub use api::{CompositionApi, ProposalApi};

// ==========================================
// Constantes do sistema
// ==========================================

// Versão do sistema
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Nome do sistema
pub const APP_NAME: &str = "Portal de Propostas - Motor de Orçamento";

// Versão do banco de dados
pub const DB_VERSION: &str = "v0.1";
