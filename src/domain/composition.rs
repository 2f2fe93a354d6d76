// ==========================================
// Portal de Propostas - Composição de preço
// ==========================================
// Uso: uma composição reúne itens ordenados que somam um valor por m²
// Alinhamento: tabelas composition / composition_item
// Regra: valores derivados (unit_value / value_per_unit_area) são sempre
// recalculados pelo engine, nunca editados à mão
// ==========================================

use crate::domain::types::CalculationMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tolerância de sincronização entre o total em cache e a soma dos itens
pub const SYNC_TOLERANCE: f64 = 0.01;

// ==========================================
// CompositionLineItem - Item de composição
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionLineItem {
    // ===== Chave e vínculo =====
    pub item_id: String,        // UUID do item
    pub composition_id: String, // Composição proprietária (FK, cascade)

    // ===== Referência de catálogo =====
    pub product_code: String, // Código do produto (snapshot resolvido a cada recálculo)

    // ===== Parâmetros de cálculo =====
    pub consumption_per_unit_area: f64, // Consumo por m² (> 0)
    pub breakage_percent: f64,          // Percentual de quebra (0 a 50)
    pub correction_factor: f64,         // Fator de correção (0.1 a 10)
    pub calculation_mode: CalculationMode, // DIRECT / YIELD / CUSTOM
    pub custom_formula: Option<String>, // Fórmula (obrigatória somente em CUSTOM)

    // ===== Ordenação =====
    pub item_order: i32, // Ordem de exibição/prioridade (lacunas permitidas)

    // ===== Valores derivados (somente recálculo) =====
    pub unit_value: f64,          // Valor unitário calculado
    pub value_per_unit_area: f64, // Valor por m² calculado

    // ===== Auditoria =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// Composition - Composição
// ==========================================
// Ciclo de vida: criada vazia; itens adicionados/editados/removidos/
// reordenados disparam recálculo do total; exclusão remove os itens
// em cascata (propriedade exclusiva)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composition {
    // ===== Chave =====
    pub composition_id: String, // UUID da composição

    // ===== Identificação =====
    pub name: String,        // Nome (ex.: "Parede dupla OSB 11mm")
    pub description: Option<String>,

    // ===== Total em cache =====
    // Regra: considerado desatualizado até o próximo recompute_total;
    // a flag synchronized existe para expor essa defasagem à interface,
    // nunca para corrigi-la silenciosamente
    pub total_value_per_unit_area: f64,

    // ===== Auditoria =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Composition {
    /// Verifica se o total em cache está sincronizado com a soma dos itens
    ///
    /// # Parâmetros
    /// - items_sum: soma corrente de value_per_unit_area dos itens
    pub fn is_synchronized(&self, items_sum: f64) -> bool {
        (items_sum - self.total_value_per_unit_area).abs() < SYNC_TOLERANCE
    }
}

// ==========================================
// CompositionView - Composição com itens e flag de sincronização
// ==========================================
// Uso: leitura para a interface (itens já ordenados)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionView {
    pub composition: Composition,
    pub items: Vec<CompositionLineItem>,
    pub items_sum: f64,     // Soma corrente de value_per_unit_area
    pub synchronized: bool, // |soma - total em cache| < SYNC_TOLERANCE
}

// ==========================================
// LineItemInput - Entrada de criação de item
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    pub product_code: String,
    pub consumption_per_unit_area: f64,
    pub breakage_percent: f64,
    pub correction_factor: f64,
    pub calculation_mode: CalculationMode,
    pub custom_formula: Option<String>,
    // Ordem explícita; quando ausente, o engine usa max(ordem existente) + 1
    pub item_order: Option<i32>,
}

// ==========================================
// LineItemPatch - Edição parcial de item
// ==========================================
// Regra: somente campos presentes são alterados; valores derivados são
// recalculados contra o preço corrente de catálogo
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemPatch {
    pub product_code: Option<String>,
    pub consumption_per_unit_area: Option<f64>,
    pub breakage_percent: Option<f64>,
    pub correction_factor: Option<f64>,
    pub calculation_mode: Option<CalculationMode>,
    // Some(None) limpa a fórmula; None mantém
    pub custom_formula: Option<Option<String>>,
}
