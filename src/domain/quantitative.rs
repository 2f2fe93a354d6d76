// ==========================================
// Portal de Propostas - Tipos do orçamento quantitativo
// ==========================================
// Uso: entrada e saída do pipeline quantitativo; não são entidades
// persistidas, apenas transitam entre assistente, orquestrador e engine
// ==========================================

use crate::domain::types::round2;
use serde::{Deserialize, Serialize};

fn default_correction_factor() -> f64 {
    1.0
}

// ==========================================
// CalculationRequest - Pedido de cálculo
// ==========================================
// Regra: objeto-valor; dois pedidos com os mesmos campos normalizados
// produzem o mesmo fingerprint e, portanto, o mesmo resultado em cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    // ===== Sistema de material =====
    #[serde(default)]
    pub sistema_codigo: String, // Código do sistema (ex.: "SH-RES")

    // ===== Dimensões físicas =====
    #[serde(default)]
    pub area_telhado: f64, // Área de telhado (m², > 0)
    #[serde(default)]
    pub comprimento_cumeeira: f64, // Comprimento de cumeeira (m, >= 0)
    #[serde(default)]
    pub perimetro_beiral: f64, // Perímetro de beiral (m, >= 0)

    // ===== Ajuste comercial =====
    #[serde(default = "default_correction_factor")]
    pub fator_correcao: f64, // Fator de correção (0.1 a 10, padrão 1.0)
}

impl CalculationRequest {
    /// Cria um pedido com fator de correção padrão
    pub fn new(sistema_codigo: &str, area_telhado: f64) -> Self {
        Self {
            sistema_codigo: sistema_codigo.to_string(),
            area_telhado,
            comprimento_cumeeira: 0.0,
            perimetro_beiral: 0.0,
            fator_correcao: 1.0,
        }
    }

    /// Normaliza o pedido para uso como chave canônica
    ///
    /// Regras:
    /// - código do sistema: trim + maiúsculas
    /// - numéricos não finitos viram 0 (zero negativo inclusive)
    /// - fator de correção omitido (0) assume o padrão 1.0
    pub fn normalized(&self) -> Self {
        fn canon(v: f64) -> f64 {
            if v.is_finite() && v != 0.0 {
                v
            } else {
                0.0
            }
        }

        let fator = canon(self.fator_correcao);
        Self {
            sistema_codigo: self.sistema_codigo.trim().to_uppercase(),
            area_telhado: canon(self.area_telhado),
            comprimento_cumeeira: canon(self.comprimento_cumeeira),
            perimetro_beiral: canon(self.perimetro_beiral),
            fator_correcao: if fator == 0.0 { 1.0 } else { fator },
        }
    }

    /// Fingerprint canônico do pedido (ordem de campos estável)
    ///
    /// Numéricos entram com 2 casas decimais: pedidos que diferem abaixo
    /// de um centavo são a mesma pergunta.
    pub fn fingerprint(&self) -> String {
        let n = self.normalized();
        format!(
            "area_telhado={:.2}|comprimento_cumeeira={:.2}|fator_correcao={:.2}|perimetro_beiral={:.2}|sistema={}",
            n.area_telhado, n.comprimento_cumeeira, n.fator_correcao, n.perimetro_beiral, n.sistema_codigo
        )
    }
}

// ==========================================
// QuantitativeItem - Item do orçamento
// ==========================================
// Regra: breakage_percent é valor de exibição derivado de net vs. com
// quebra (a quebra pode ter sido aplicada em mais de um ponto a montante)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitativeItem {
    pub code: String,                // Código do produto
    pub description: String,         // Descrição de catálogo
    pub category: String,            // Categoria de agrupamento
    pub net_quantity: f64,           // Quantidade líquida (antes da quebra)
    pub breakage_percent: f64,       // Derivado: (com quebra - líquida) / líquida x 100
    pub quantity_with_breakage: f64, // Quantidade com quebra
    pub sales_unit: String,          // Unidade de venda
    pub package_count: i64,          // Embalagens inteiras: ceil(com quebra / embalagem)
    pub unit_price: f64,             // Preço por embalagem
    pub line_total: f64,             // package_count x unit_price
    pub sort_order: i32,             // Ordem dentro da categoria
}

// ==========================================
// ComputationWarning - Avisos estruturados do pipeline
// ==========================================
// Regra: avisos não interrompem o cálculo; existem para a interface
// registrar/alertar em vez de perder informação silenciosamente
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComputationWarning {
    /// Duplicata descartada na deduplicação por (código, categoria)
    DuplicateDiscarded {
        code: String,
        category: String,
        kept_sort_order: i32,
        discarded_sort_order: i32,
    },
    /// Cálculo bem-sucedido sem nenhum item aplicável
    EmptyResult,
    /// Percentual de quebra derivado fora da janela sanitária [0, 50]
    BreakageOutlier { code: String, breakage_percent: f64 },
    /// Item com quantidade final zerada
    ZeroQuantity { code: String },
    /// Item com preço de catálogo zerado
    ZeroPrice { code: String },
}

// ==========================================
// QuantitativeOutput - Resultado do pipeline
// ==========================================
// Regra: lista vazia é sucesso legítimo (distinto de erro); o aviso
// EmptyResult acompanha esse caso
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitativeOutput {
    pub items: Vec<QuantitativeItem>,
    pub warnings: Vec<ComputationWarning>,
}

impl QuantitativeOutput {
    /// Valor total do orçamento (soma dos totais de linha)
    pub fn total_value(&self) -> f64 {
        round2(self.items.iter().map(|i| i.line_total).sum())
    }

    /// Indica resultado vazio (sucesso sem itens)
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
