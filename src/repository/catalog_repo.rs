// ==========================================
// Portal de Propostas - Consulta de catálogo
// ==========================================
// Responsabilidade: contrato de consulta de produtos (colaborador
// injetado no engine) e implementações SQLite / em memória
// Regra: o engine enxerga somente o trait; nunca a tabela
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::product::ProductRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// CatalogLookup - Contrato de consulta
// ==========================================
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Busca um produto pelo código
    ///
    /// # Retorno
    /// - Ok(ProductRecord): snapshot imutável do produto
    /// - Err(NotFound): código inexistente no catálogo
    async fn get_product(&self, code: &str) -> RepositoryResult<ProductRecord>;

    /// Lista os produtos de uma categoria
    async fn list_products_by_category(
        &self,
        category: &str,
    ) -> RepositoryResult<Vec<ProductRecord>>;
}

// ==========================================
// SqliteCatalogRepository - Catálogo persistido
// ==========================================
pub struct SqliteCatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogRepository {
    /// Cria o repositório a partir do caminho do banco
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    /// Cria o repositório a partir de uma conexão existente
    ///
    /// Reaplica o PRAGMA unificado (idempotente) para garantir o mesmo
    /// comportamento de qualquer conexão recebida.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Garante a existência da tabela de catálogo
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS catalog_product (
                code TEXT PRIMARY KEY,
                description TEXT NOT NULL,
                unit_price REAL NOT NULL,
                package_size REAL NOT NULL,
                unit_of_measure TEXT NOT NULL,
                category TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_catalog_product_category
              ON catalog_product(category);
            "#,
        )?;
        Ok(())
    }

    /// Insere ou atualiza um produto (carga administrativa e testes)
    pub fn upsert_product(&self, product: &ProductRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO catalog_product (
                code, description, unit_price, package_size, unit_of_measure, category
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(code) DO UPDATE SET
                description = excluded.description,
                unit_price = excluded.unit_price,
                package_size = excluded.package_size,
                unit_of_measure = excluded.unit_of_measure,
                category = excluded.category
            "#,
            params![
                product.code,
                product.description,
                product.unit_price,
                product.package_size,
                product.unit_of_measure,
                product.category,
            ],
        )?;
        Ok(())
    }

    fn row_to_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProductRecord> {
        Ok(ProductRecord {
            code: row.get(0)?,
            description: row.get(1)?,
            unit_price: row.get(2)?,
            package_size: row.get(3)?,
            unit_of_measure: row.get(4)?,
            category: row.get(5)?,
        })
    }
}

#[async_trait]
impl CatalogLookup for SqliteCatalogRepository {
    async fn get_product(&self, code: &str) -> RepositoryResult<ProductRecord> {
        let conn = self.get_conn()?;
        let product = conn
            .query_row(
                r#"
                SELECT code, description, unit_price, package_size, unit_of_measure, category
                FROM catalog_product
                WHERE code = ?1
                "#,
                params![code],
                Self::row_to_product,
            )
            .optional()?;

        product.ok_or_else(|| RepositoryError::NotFound {
            entity: "ProductRecord".to_string(),
            id: code.to_string(),
        })
    }

    async fn list_products_by_category(
        &self,
        category: &str,
    ) -> RepositoryResult<Vec<ProductRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT code, description, unit_price, package_size, unit_of_measure, category
            FROM catalog_product
            WHERE category = ?1
            ORDER BY code ASC
            "#,
        )?;

        let rows = stmt.query_map(params![category], Self::row_to_product)?;
        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }
}

// ==========================================
// InMemoryCatalog - Catálogo em memória
// ==========================================
// Uso: testes e composições efêmeras (assistentes sem banco local)
#[derive(Default)]
pub struct InMemoryCatalog {
    products: Mutex<HashMap<String, ProductRecord>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Carrega um conjunto inicial de produtos
    pub fn with_products(products: Vec<ProductRecord>) -> Self {
        let catalog = Self::new();
        for product in products {
            catalog.insert(product);
        }
        catalog
    }

    /// Insere ou substitui um produto
    pub fn insert(&self, product: ProductRecord) {
        let mut guard = match self.products.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(product.code.clone(), product);
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn get_product(&self, code: &str) -> RepositoryResult<ProductRecord> {
        let guard = self
            .products
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        guard
            .get(code)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "ProductRecord".to_string(),
                id: code.to_string(),
            })
    }

    async fn list_products_by_category(
        &self,
        category: &str,
    ) -> RepositoryResult<Vec<ProductRecord>> {
        let guard = self
            .products
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let mut products: Vec<ProductRecord> = guard
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_connection;

    fn sample_product() -> ProductRecord {
        ProductRecord::new("OSB-11", "Placa OSB 11mm", 45.0, 1.0, "PC", "ESTRUTURA")
    }

    #[tokio::test]
    async fn test_sqlite_catalog_round_trip() {
        let conn = Arc::new(Mutex::new(open_in_memory_connection().unwrap()));
        let repo = SqliteCatalogRepository::from_connection(conn).unwrap();

        repo.upsert_product(&sample_product()).unwrap();

        let found = repo.get_product("OSB-11").await.unwrap();
        assert_eq!(found.unit_price, 45.0);
        assert_eq!(found.category, "ESTRUTURA");

        let missing = repo.get_product("INEXISTENTE").await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_sqlite_catalog_list_by_category() {
        let conn = Arc::new(Mutex::new(open_in_memory_connection().unwrap()));
        let repo = SqliteCatalogRepository::from_connection(conn).unwrap();

        repo.upsert_product(&sample_product()).unwrap();
        repo.upsert_product(&ProductRecord::new(
            "PREGO-17",
            "Prego anelado 17x27",
            12.5,
            1.0,
            "KG",
            "FIXACAO",
        ))
        .unwrap();

        let estrutura = repo.list_products_by_category("ESTRUTURA").await.unwrap();
        assert_eq!(estrutura.len(), 1);
        assert_eq!(estrutura[0].code, "OSB-11");

        let vazio = repo.list_products_by_category("COBERTURA").await.unwrap();
        assert!(vazio.is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_catalog() {
        let catalog = InMemoryCatalog::with_products(vec![sample_product()]);
        let found = catalog.get_product("OSB-11").await.unwrap();
        assert_eq!(found.package_size, 1.0);

        let missing = catalog.get_product("NADA").await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));
    }
}
