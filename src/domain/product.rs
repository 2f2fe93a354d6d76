// ==========================================
// Portal de Propostas - Produto de catálogo
// ==========================================
// Uso: snapshot imutável por cálculo; o motor nunca altera o catálogo
// Alinhamento: tabela catalog_product
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ProductRecord - Registro de produto
// ==========================================
// Regra: preço sempre por unidade de venda (embalagem); a conversão para
// valor unitário acontece no calculador, nunca aqui
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    // ===== Chave =====
    pub code: String, // Código único do produto (ex.: "OSB-11")

    // ===== Dados comerciais =====
    pub description: String,  // Descrição de exibição
    pub unit_price: f64,      // Preço por unidade de venda (R$, >= 0)
    pub package_size: f64,    // Quantidade por unidade de venda (> 0)
    pub unit_of_measure: String, // Unidade de medida (ex.: "PC", "M2", "KG")

    // ===== Classificação =====
    pub category: String, // Categoria (ex.: "ESTRUTURA", "FIXACAO")
}

impl ProductRecord {
    /// Cria um snapshot de produto para cálculo
    pub fn new(
        code: &str,
        description: &str,
        unit_price: f64,
        package_size: f64,
        unit_of_measure: &str,
        category: &str,
    ) -> Self {
        Self {
            code: code.to_string(),
            description: description.to_string(),
            unit_price,
            package_size,
            unit_of_measure: unit_of_measure.to_string(),
            category: category.to_string(),
        }
    }
}
