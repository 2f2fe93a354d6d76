// ==========================================
// Portal de Propostas - Gerenciador de configuração
// ==========================================
// Responsabilidade: carga, consulta e sobrescrita de configuração
// Armazenamento: tabela config_kv (key-value + escopo)
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use crate::config::system_registry::SystemRegistry;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ===== Valores padrão =====
const DEFAULT_DEBOUNCE_WINDOW_MS: u64 = 300;
const DEFAULT_COMPUTATION_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_AREA_MAX_M2: f64 = 10_000.0;
const DEFAULT_LENGTH_MAX_M: f64 = 1_000.0;

const SYSTEM_REGISTRY_KEY: &str = "system_registry";

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// Cria um ConfigManager a partir do caminho do banco
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_table()?;
        Ok(manager)
    }

    /// Cria um ConfigManager a partir de uma conexão existente
    ///
    /// Reaplica o PRAGMA unificado (idempotente) na conexão recebida.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let guard = conn.lock().map_err(|e| format!("falha de lock: {}", e))?;
            configure_sqlite_connection(&guard)?;
        }
        let manager = Self { conn };
        manager.ensure_table()?;
        Ok(manager)
    }

    /// Garante a existência da tabela config_kv
    fn ensure_table(&self) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("falha de lock: {}", e))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config_kv (
                scope_id TEXT NOT NULL DEFAULT 'global',
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (scope_id, key)
            );
            "#,
        )?;
        Ok(())
    }

    /// Lê um valor de configuração (scope_id='global')
    ///
    /// # Retorno
    /// - Some(String): valor configurado
    /// - None: chave ausente
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("falha de lock: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Grava um valor de configuração (scope_id='global')
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("falha de lock: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
            ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// Lê um valor numérico com padrão
    fn get_f64_or(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => Ok(raw.trim().parse::<f64>()?),
            None => Ok(default),
        }
    }

    /// Lê um valor inteiro sem sinal com padrão
    fn get_u64_or(&self, key: &str, default: u64) -> Result<u64, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => Ok(raw.trim().parse::<u64>()?),
            None => Ok(default),
        }
    }

    /// Grava o registro de sistemas (JSON em config_kv)
    pub fn set_system_registry(&self, registry: &SystemRegistry) -> Result<(), Box<dyn Error>> {
        let json = registry.to_json()?;
        self.set_config_value(SYSTEM_REGISTRY_KEY, &json)
    }
}

#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn get_debounce_window_ms(&self) -> Result<u64, Box<dyn Error>> {
        self.get_u64_or("debounce_window_ms", DEFAULT_DEBOUNCE_WINDOW_MS)
    }

    async fn get_computation_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        self.get_u64_or("computation_timeout_ms", DEFAULT_COMPUTATION_TIMEOUT_MS)
    }

    async fn get_area_max_m2(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64_or("area_max_m2", DEFAULT_AREA_MAX_M2)
    }

    async fn get_length_max_m(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64_or("length_max_m", DEFAULT_LENGTH_MAX_M)
    }

    async fn get_system_registry(&self) -> Result<SystemRegistry, Box<dyn Error>> {
        match self.get_config_value(SYSTEM_REGISTRY_KEY)? {
            Some(json) => Ok(SystemRegistry::from_json(&json)?),
            None => Ok(SystemRegistry::default_registry()),
        }
    }
}
