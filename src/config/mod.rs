// ==========================================
// Portal de Propostas - Camada de configuração
// ==========================================
// Responsabilidade: configuração do sistema (config_kv + registro de
// sistemas de material)
// ==========================================

pub mod config_manager;
pub mod engine_config_trait;
pub mod system_registry;

pub use config_manager::ConfigManager;
pub use engine_config_trait::EngineConfigReader;
pub use system_registry::{MaterialRule, SystemDefinition, SystemRegistry};
