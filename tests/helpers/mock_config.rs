// ==========================================
// Mock de configuração - para testes de integração
// ==========================================

use async_trait::async_trait;
use orcamento_engine::config::{EngineConfigReader, SystemRegistry};
use std::error::Error;

/// Configuração mock com janelas e registro ajustáveis
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub debounce_window_ms: u64,
    pub computation_timeout_ms: u64,
    pub area_max_m2: f64,
    pub length_max_m: f64,
    pub registry: SystemRegistry,
}

impl MockConfig {
    /// Configuração padrão de teste (sem debounce, timeout generoso)
    pub fn default() -> Self {
        Self {
            debounce_window_ms: 0,
            computation_timeout_ms: 5_000,
            area_max_m2: 10_000.0,
            length_max_m: 1_000.0,
            registry: SystemRegistry::default_registry(),
        }
    }

    /// Configuração com registro customizado
    pub fn with_registry(registry: SystemRegistry) -> Self {
        let mut config = Self::default();
        config.registry = registry;
        config
    }

    /// Define a janela de debounce
    pub fn with_debounce(mut self, debounce_ms: u64) -> Self {
        self.debounce_window_ms = debounce_ms;
        self
    }

    /// Define o timeout de cálculo
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.computation_timeout_ms = timeout_ms;
        self
    }
}

#[async_trait]
impl EngineConfigReader for MockConfig {
    async fn get_debounce_window_ms(&self) -> Result<u64, Box<dyn Error>> {
        Ok(self.debounce_window_ms)
    }

    async fn get_computation_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        Ok(self.computation_timeout_ms)
    }

    async fn get_area_max_m2(&self) -> Result<f64, Box<dyn Error>> {
        Ok(self.area_max_m2)
    }

    async fn get_length_max_m(&self) -> Result<f64, Box<dyn Error>> {
        Ok(self.length_max_m)
    }

    async fn get_system_registry(&self) -> Result<SystemRegistry, Box<dyn Error>> {
        Ok(self.registry.clone())
    }
}
