// ==========================================
// Construtor de dados de teste - para testes de integração
// ==========================================

use async_trait::async_trait;
use orcamento_engine::config::{MaterialRule, SystemDefinition, SystemRegistry};
use orcamento_engine::domain::{
    CalculationMode, CalculationRequest, DimensionBasis, ProductRecord,
};
use orcamento_engine::repository::{CatalogLookup, InMemoryCatalog, RepositoryResult};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

// ==========================================
// Catálogo de teste
// ==========================================

/// Catálogo shingle padrão dos testes
pub fn shingle_catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_products(vec![
        ProductRecord::new("OSB-11", "Placa OSB 11mm 1.20x2.40", 45.0, 1.0, "PC", "ESTRUTURA"),
        ProductRecord::new("TELHA-SH", "Telha shingle fardo", 189.9, 1.0, "FD", "COBERTURA"),
        ProductRecord::new("MANTA-SUB", "Manta de subcobertura rolo 43m²", 240.0, 1.0, "RL", "IMPERMEABILIZACAO"),
        ProductRecord::new("PREGO-17", "Prego anelado 17x27", 12.5, 1.0, "KG", "FIXACAO"),
        ProductRecord::new("CUMEEIRA-SH", "Peça de cumeeira shingle", 35.0, 1.0, "PC", "ACABAMENTO"),
        ProductRecord::new("DRIP-BEIRAL", "Perfil drip de beiral 2m", 28.0, 1.0, "PC", "ACABAMENTO"),
        ProductRecord::new("BRINDE-01", "Manual de instalação", 0.0, 1.0, "PC", "ACABAMENTO"),
    ])
}

// ==========================================
// Construtor de regra de material
// ==========================================

pub struct RuleBuilder {
    product_code: String,
    basis: DimensionBasis,
    consumption_per_unit: f64,
    breakage_percent: f64,
    correction_factor: f64,
    sort_order: i32,
}

impl RuleBuilder {
    pub fn new(product_code: &str) -> Self {
        Self {
            product_code: product_code.to_string(),
            basis: DimensionBasis::Area,
            consumption_per_unit: 1.0,
            breakage_percent: 0.0,
            correction_factor: 1.0,
            sort_order: 1,
        }
    }

    pub fn basis(mut self, basis: DimensionBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn consumption(mut self, consumption: f64) -> Self {
        self.consumption_per_unit = consumption;
        self
    }

    pub fn breakage(mut self, breakage_percent: f64) -> Self {
        self.breakage_percent = breakage_percent;
        self
    }

    pub fn sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn build(self) -> MaterialRule {
        MaterialRule {
            product_code: self.product_code,
            basis: self.basis,
            consumption_per_unit: self.consumption_per_unit,
            breakage_percent: self.breakage_percent,
            correction_factor: self.correction_factor,
            calculation_mode: CalculationMode::Direct,
            sort_order: self.sort_order,
        }
    }
}

/// Registro de um único sistema de teste
pub fn registry_with_rules(system_code: &str, rules: Vec<MaterialRule>) -> SystemRegistry {
    SystemRegistry {
        systems: vec![SystemDefinition {
            system_code: system_code.to_string(),
            proposal_type: "TELHADO_SHINGLE".to_string(),
            description: "Sistema de teste".to_string(),
            rules,
        }],
    }
}

// ==========================================
// Construtor de pedido de cálculo
// ==========================================

pub struct RequestBuilder {
    request: CalculationRequest,
}

impl RequestBuilder {
    pub fn new(sistema_codigo: &str, area_telhado: f64) -> Self {
        Self {
            request: CalculationRequest::new(sistema_codigo, area_telhado),
        }
    }

    pub fn cumeeira(mut self, comprimento: f64) -> Self {
        self.request.comprimento_cumeeira = comprimento;
        self
    }

    pub fn beiral(mut self, perimetro: f64) -> Self {
        self.request.perimetro_beiral = perimetro;
        self
    }

    pub fn fator(mut self, fator_correcao: f64) -> Self {
        self.request.fator_correcao = fator_correcao;
        self
    }

    pub fn build(self) -> CalculationRequest {
        self.request
    }
}

// ==========================================
// Catálogo com contagem de consultas
// ==========================================
// Uso: verificar quantas vezes o pipeline realmente executou
pub struct CountingCatalog {
    inner: Arc<dyn CatalogLookup>,
    lookups: AtomicUsize,
}

impl CountingCatalog {
    pub fn new(inner: Arc<dyn CatalogLookup>) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Total de consultas get_product efetuadas
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogLookup for CountingCatalog {
    async fn get_product(&self, code: &str) -> RepositoryResult<ProductRecord> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_product(code).await
    }

    async fn list_products_by_category(
        &self,
        category: &str,
    ) -> RepositoryResult<Vec<ProductRecord>> {
        self.inner.list_products_by_category(category).await
    }
}

// ==========================================
// Catálogo com latência configurável
// ==========================================
// Uso: simular consulta lenta para exercitar timeout, single-flight e
// cancelamento do orquestrador
pub struct SlowCatalog {
    inner: Arc<dyn CatalogLookup>,
    delay_ms: AtomicU64,
}

impl SlowCatalog {
    pub fn new(inner: Arc<dyn CatalogLookup>, delay_ms: u64) -> Self {
        Self {
            inner,
            delay_ms: AtomicU64::new(delay_ms),
        }
    }

    /// Ajusta a latência simulada
    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.delay_ms.store(delay_ms, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogLookup for SlowCatalog {
    async fn get_product(&self, code: &str) -> RepositoryResult<ProductRecord> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        self.inner.get_product(code).await
    }

    async fn list_products_by_category(
        &self,
        category: &str,
    ) -> RepositoryResult<Vec<ProductRecord>> {
        self.inner.list_products_by_category(category).await
    }
}
