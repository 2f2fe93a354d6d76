// ==========================================
// Portal de Propostas - Repositório de composições
// ==========================================
// Responsabilidade: CRUD de composition / composition_item
// Regra: ordem dos itens com lacunas permitidas; renumeração somente
// via reordenação explícita
// Regra: exclusão de composição remove itens em cascata (FK)
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::composition::{Composition, CompositionLineItem};
use crate::domain::types::CalculationMode;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// CompositionRepository
// ==========================================
pub struct CompositionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CompositionRepository {
    /// Cria o repositório a partir do caminho do banco
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_tables()?;
        Ok(repo)
    }

    /// Cria o repositório a partir de uma conexão existente
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        let repo = Self { conn };
        repo.ensure_tables()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Garante a existência das tabelas de composição
    fn ensure_tables(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS composition (
                composition_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                total_value_per_unit_area REAL NOT NULL DEFAULT 0.0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS composition_item (
                item_id TEXT PRIMARY KEY,
                composition_id TEXT NOT NULL
                    REFERENCES composition(composition_id) ON DELETE CASCADE,
                product_code TEXT NOT NULL,
                consumption_per_unit_area REAL NOT NULL,
                breakage_percent REAL NOT NULL,
                correction_factor REAL NOT NULL,
                calculation_mode TEXT NOT NULL,
                custom_formula TEXT,
                item_order INTEGER NOT NULL,
                unit_value REAL NOT NULL DEFAULT 0.0,
                value_per_unit_area REAL NOT NULL DEFAULT 0.0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_composition_item_composition
              ON composition_item(composition_id, item_order);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // Conversões de linha
    // ==========================================

    fn row_to_composition(row: &rusqlite::Row<'_>) -> rusqlite::Result<Composition> {
        Ok(Composition {
            composition_id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            total_value_per_unit_area: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<CompositionLineItem> {
        let mode_str: String = row.get(6)?;
        let calculation_mode = CalculationMode::from_str(&mode_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                format!("modo de cálculo desconhecido: {}", mode_str).into(),
            )
        })?;

        Ok(CompositionLineItem {
            item_id: row.get(0)?,
            composition_id: row.get(1)?,
            product_code: row.get(2)?,
            consumption_per_unit_area: row.get(3)?,
            breakage_percent: row.get(4)?,
            correction_factor: row.get(5)?,
            calculation_mode,
            custom_formula: row.get(7)?,
            item_order: row.get(8)?,
            unit_value: row.get(9)?,
            value_per_unit_area: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    const ITEM_COLUMNS: &'static str = "item_id, composition_id, product_code, \
         consumption_per_unit_area, breakage_percent, correction_factor, \
         calculation_mode, custom_formula, item_order, unit_value, \
         value_per_unit_area, created_at, updated_at";

    // ==========================================
    // Operações de composição
    // ==========================================

    /// Cria uma composição vazia
    pub fn create_composition(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> RepositoryResult<Composition> {
        let now = Utc::now();
        let composition = Composition {
            composition_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.map(|d| d.to_string()),
            total_value_per_unit_area: 0.0,
            created_at: now,
            updated_at: now,
        };

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO composition (
                composition_id, name, description, total_value_per_unit_area,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                composition.composition_id,
                composition.name,
                composition.description,
                composition.total_value_per_unit_area,
                composition.created_at,
                composition.updated_at,
            ],
        )?;

        Ok(composition)
    }

    /// Busca uma composição pelo id
    pub fn find_composition(&self, composition_id: &str) -> RepositoryResult<Option<Composition>> {
        let conn = self.get_conn()?;
        let composition = conn
            .query_row(
                r#"
                SELECT composition_id, name, description, total_value_per_unit_area,
                       created_at, updated_at
                FROM composition
                WHERE composition_id = ?1
                "#,
                params![composition_id],
                Self::row_to_composition,
            )
            .optional()?;
        Ok(composition)
    }

    /// Lista todas as composições (ordem de criação)
    pub fn list_compositions(&self) -> RepositoryResult<Vec<Composition>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT composition_id, name, description, total_value_per_unit_area,
                   created_at, updated_at
            FROM composition
            ORDER BY created_at ASC, composition_id ASC
            "#,
        )?;
        let rows = stmt.query_map([], Self::row_to_composition)?;
        let mut compositions = Vec::new();
        for row in rows {
            compositions.push(row?);
        }
        Ok(compositions)
    }

    /// Exclui uma composição e seus itens (cascata)
    pub fn delete_composition(&self, composition_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM composition WHERE composition_id = ?1",
            params![composition_id],
        )?;
        Ok(affected > 0)
    }

    /// Atualiza o total em cache da composição
    pub fn update_cached_total(&self, composition_id: &str, total: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE composition
            SET total_value_per_unit_area = ?1, updated_at = ?2
            WHERE composition_id = ?3
            "#,
            params![total, Utc::now(), composition_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Composition".to_string(),
                id: composition_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // Operações de item
    // ==========================================

    /// Insere um item de composição
    pub fn insert_item(&self, item: &CompositionLineItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO composition_item (
                item_id, composition_id, product_code, consumption_per_unit_area,
                breakage_percent, correction_factor, calculation_mode, custom_formula,
                item_order, unit_value, value_per_unit_area, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                item.item_id,
                item.composition_id,
                item.product_code,
                item.consumption_per_unit_area,
                item.breakage_percent,
                item.correction_factor,
                item.calculation_mode.as_str(),
                item.custom_formula,
                item.item_order,
                item.unit_value,
                item.value_per_unit_area,
                item.created_at,
                item.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Atualiza um item de composição (linha completa)
    pub fn update_item(&self, item: &CompositionLineItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE composition_item
            SET product_code = ?1,
                consumption_per_unit_area = ?2,
                breakage_percent = ?3,
                correction_factor = ?4,
                calculation_mode = ?5,
                custom_formula = ?6,
                item_order = ?7,
                unit_value = ?8,
                value_per_unit_area = ?9,
                updated_at = ?10
            WHERE item_id = ?11
            "#,
            params![
                item.product_code,
                item.consumption_per_unit_area,
                item.breakage_percent,
                item.correction_factor,
                item.calculation_mode.as_str(),
                item.custom_formula,
                item.item_order,
                item.unit_value,
                item.value_per_unit_area,
                item.updated_at,
                item.item_id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CompositionLineItem".to_string(),
                id: item.item_id.clone(),
            });
        }
        Ok(())
    }

    /// Atualiza somente os valores derivados de um item
    ///
    /// Uso: refresh de catálogo, quando apenas unit_value e
    /// value_per_unit_area mudam
    pub fn update_item_values(
        &self,
        item_id: &str,
        unit_value: f64,
        value_per_unit_area: f64,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE composition_item
            SET unit_value = ?1, value_per_unit_area = ?2, updated_at = ?3
            WHERE item_id = ?4
            "#,
            params![unit_value, value_per_unit_area, updated_at, item_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CompositionLineItem".to_string(),
                id: item_id.to_string(),
            });
        }
        Ok(())
    }

    /// Exclui um item
    pub fn delete_item(&self, item_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM composition_item WHERE item_id = ?1",
            params![item_id],
        )?;
        Ok(affected > 0)
    }

    /// Busca um item pelo id
    pub fn find_item(&self, item_id: &str) -> RepositoryResult<Option<CompositionLineItem>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM composition_item WHERE item_id = ?1",
            Self::ITEM_COLUMNS
        );
        let item = conn
            .query_row(&sql, params![item_id], Self::row_to_item)
            .optional()?;
        Ok(item)
    }

    /// Lista os itens de uma composição em ordem
    pub fn list_items(&self, composition_id: &str) -> RepositoryResult<Vec<CompositionLineItem>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM composition_item WHERE composition_id = ?1 \
             ORDER BY item_order ASC, item_id ASC",
            Self::ITEM_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![composition_id], Self::row_to_item)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Maior ordem corrente dos itens da composição (consulta atômica)
    ///
    /// # Retorno
    /// - None: composição sem itens
    pub fn max_item_order(&self, composition_id: &str) -> RepositoryResult<Option<i32>> {
        let conn = self.get_conn()?;
        let max: Option<i32> = conn.query_row(
            "SELECT MAX(item_order) FROM composition_item WHERE composition_id = ?1",
            params![composition_id],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    /// Reatribui ordens em lote (transacional)
    ///
    /// # Parâmetros
    /// - pairs: (item_id, nova ordem)
    pub fn update_item_orders(
        &self,
        composition_id: &str,
        pairs: &[(String, i32)],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut updated = 0usize;
        for (item_id, new_order) in pairs {
            let affected = tx.execute(
                r#"
                UPDATE composition_item
                SET item_order = ?1, updated_at = ?2
                WHERE item_id = ?3 AND composition_id = ?4
                "#,
                params![new_order, Utc::now(), item_id, composition_id],
            )?;
            if affected == 0 {
                return Err(RepositoryError::NotFound {
                    entity: "CompositionLineItem".to_string(),
                    id: item_id.clone(),
                });
            }
            updated += affected;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_connection;

    fn setup_repo() -> CompositionRepository {
        let conn = Arc::new(Mutex::new(open_in_memory_connection().unwrap()));
        CompositionRepository::from_connection(conn).unwrap()
    }

    fn sample_item(composition_id: &str, order: i32) -> CompositionLineItem {
        let now = Utc::now();
        CompositionLineItem {
            item_id: Uuid::new_v4().to_string(),
            composition_id: composition_id.to_string(),
            product_code: "OSB-11".to_string(),
            consumption_per_unit_area: 1.0,
            breakage_percent: 10.0,
            correction_factor: 1.0,
            calculation_mode: CalculationMode::Direct,
            custom_formula: None,
            item_order: order,
            unit_value: 45.0,
            value_per_unit_area: 49.5,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_and_find_composition() {
        let repo = setup_repo();
        let created = repo
            .create_composition("Parede OSB", Some("Parede dupla"))
            .unwrap();

        let found = repo.find_composition(&created.composition_id).unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().name, "Parede OSB");
    }

    #[test]
    fn test_max_item_order() {
        let repo = setup_repo();
        let comp = repo.create_composition("C", None).unwrap();

        assert_eq!(repo.max_item_order(&comp.composition_id).unwrap(), None);

        repo.insert_item(&sample_item(&comp.composition_id, 3)).unwrap();
        repo.insert_item(&sample_item(&comp.composition_id, 7)).unwrap();

        assert_eq!(repo.max_item_order(&comp.composition_id).unwrap(), Some(7));
    }

    #[test]
    fn test_cascade_delete_removes_items() {
        let repo = setup_repo();
        let comp = repo.create_composition("C", None).unwrap();
        repo.insert_item(&sample_item(&comp.composition_id, 1)).unwrap();
        repo.insert_item(&sample_item(&comp.composition_id, 2)).unwrap();

        assert!(repo.delete_composition(&comp.composition_id).unwrap());

        let items = repo.list_items(&comp.composition_id).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_update_item_orders_transactional() {
        let repo = setup_repo();
        let comp = repo.create_composition("C", None).unwrap();
        let a = sample_item(&comp.composition_id, 1);
        let b = sample_item(&comp.composition_id, 2);
        repo.insert_item(&a).unwrap();
        repo.insert_item(&b).unwrap();

        // Um id inexistente aborta a transação inteira
        let result = repo.update_item_orders(
            &comp.composition_id,
            &[(a.item_id.clone(), 2), ("nao-existe".to_string(), 1)],
        );
        assert!(result.is_err());

        let items = repo.list_items(&comp.composition_id).unwrap();
        assert_eq!(items[0].item_id, a.item_id);
        assert_eq!(items[0].item_order, 1);

        // Reordenação válida aplica as duas trocas
        repo.update_item_orders(
            &comp.composition_id,
            &[(a.item_id.clone(), 2), (b.item_id.clone(), 1)],
        )
        .unwrap();

        let items = repo.list_items(&comp.composition_id).unwrap();
        assert_eq!(items[0].item_id, b.item_id);
        assert_eq!(items[1].item_id, a.item_id);
    }
}
