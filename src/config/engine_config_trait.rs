// ==========================================
// Portal de Propostas - Trait de leitura de configuração do engine
// ==========================================
// Responsabilidade: definir a interface de leitura de configuração
// consumida pelo pipeline e pelo orquestrador (sem implementação)
// Regra: não inclui escrita de configuração nem regra de negócio
// ==========================================

use crate::config::system_registry::SystemRegistry;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// Implementação de referência: ConfigManager (tabela config_kv)
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    // ===== Janelas do orquestrador =====

    /// Janela de debounce do orquestrador (milissegundos)
    ///
    /// # Padrão
    /// - 300
    async fn get_debounce_window_ms(&self) -> Result<u64, Box<dyn Error>>;

    /// Tempo máximo de uma computação (milissegundos)
    ///
    /// # Padrão
    /// - 10_000
    async fn get_computation_timeout_ms(&self) -> Result<u64, Box<dyn Error>>;

    // ===== Limites de validação =====

    /// Limite superior de área de telhado (m²)
    ///
    /// # Padrão
    /// - 10_000.0
    async fn get_area_max_m2(&self) -> Result<f64, Box<dyn Error>>;

    /// Limite superior de dimensões lineares (m)
    ///
    /// # Padrão
    /// - 1_000.0
    async fn get_length_max_m(&self) -> Result<f64, Box<dyn Error>>;

    // ===== Registro de sistemas =====

    /// Registro de sistemas de material (tipo de proposta + regras)
    ///
    /// # Padrão
    /// - SystemRegistry::default_registry() quando não configurado
    async fn get_system_registry(&self) -> Result<SystemRegistry, Box<dyn Error>>;
}
