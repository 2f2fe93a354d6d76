// ==========================================
// Portal de Propostas - Inicialização SQLite
// ==========================================
// Objetivo:
// - Unificar o comportamento de PRAGMA em todos os Connection::open,
//   evitando "parte dos módulos com foreign keys ligado / parte sem"
// - Unificar busy_timeout, reduzindo erros busy esporádicos em escrita
//   concorrente
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// busy_timeout padrão (milissegundos)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Configura os PRAGMA unificados de uma conexão SQLite
///
/// Observações:
/// - foreign_keys precisa ser ligado por conexão
/// - busy_timeout precisa ser configurado por conexão
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Abre uma conexão SQLite já com a configuração unificada aplicada
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Abre uma conexão SQLite em memória (testes e composições efêmeras)
pub fn open_in_memory_connection() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Caminho padrão do banco de dados do portal
///
/// Usa o diretório de dados do usuário; cai para o diretório corrente
/// quando o sistema não o expõe (ambientes de CI).
pub fn default_db_path() -> String {
    let mut base: PathBuf = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push("portal-propostas");
    base.push("orcamento.db");
    base.to_string_lossy().to_string()
}
