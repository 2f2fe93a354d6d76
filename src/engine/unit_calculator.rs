// ==========================================
// Portal de Propostas - Calculador de valor unitário
// ==========================================
// Responsabilidade: função pura de valor de item; sem I/O, sem efeito
// colateral
// Regra: arredondamento para 2 casas somente na fronteira (nunca no
// meio do cálculo)
// ==========================================

use crate::domain::product::ProductRecord;
use crate::domain::types::{round2, CalculationMode};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::formula::FormulaEvaluator;
use std::collections::HashMap;

// ==========================================
// LineValue - Valores derivados de um item
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineValue {
    pub unit_value: f64,          // Valor unitário (R$ por unidade do produto)
    pub value_per_unit_area: f64, // Valor por m²
}

/// Valor unitário bruto: preço da embalagem dividido pelo conteúdo
///
/// package_size <= 0 é tolerado com fallback para o preço cheio
/// (dado degradado de catálogo não derruba o cálculo).
fn raw_unit_value(product: &ProductRecord) -> f64 {
    if product.package_size > 0.0 {
        product.unit_price / product.package_size
    } else {
        product.unit_price
    }
}

/// Calcula os valores derivados de um item de composição
///
/// # Parâmetros
/// - product: snapshot de catálogo
/// - consumption: consumo por m²
/// - breakage_percent: percentual de quebra
/// - correction_factor: fator de correção
/// - mode: modo de cálculo
/// - custom_formula: fórmula (obrigatória somente em CUSTOM)
///
/// # Modos
/// - DIRECT: valor/m² = consumo x valor unitário x (1 + quebra/100) x fator
/// - YIELD: valor/m² = valor unitário x (1 + quebra/100) x fator;
///   o consumo é ignorado neste modo - precificação por rendimento é
///   por embalagem, comportamento confirmado com o produto, não "corrigir"
/// - CUSTOM: valor/m² = fórmula com {preco} {consumo} {quebra} {fator}
///   {rendimento}
pub fn compute_line_value(
    product: &ProductRecord,
    consumption: f64,
    breakage_percent: f64,
    correction_factor: f64,
    mode: CalculationMode,
    custom_formula: Option<&str>,
) -> EngineResult<LineValue> {
    let unit_value = raw_unit_value(product);
    let breakage_multiplier = 1.0 + breakage_percent / 100.0;

    let value_per_unit_area = match mode {
        CalculationMode::Direct => {
            consumption * unit_value * breakage_multiplier * correction_factor
        }
        CalculationMode::Yield => unit_value * breakage_multiplier * correction_factor,
        CalculationMode::Custom => {
            let formula = custom_formula
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .ok_or_else(|| {
                    EngineError::formula("", "modo CUSTOM exige fórmula não vazia")
                })?;

            let variables = HashMap::from([
                ("preco".to_string(), product.unit_price),
                ("consumo".to_string(), consumption),
                ("quebra".to_string(), breakage_percent),
                ("fator".to_string(), correction_factor),
                ("rendimento".to_string(), product.package_size),
            ]);
            FormulaEvaluator::evaluate(formula, &variables)?
        }
    };

    Ok(LineValue {
        unit_value: round2(unit_value),
        value_per_unit_area: round2(value_per_unit_area),
    })
}
