// ==========================================
// Portal de Propostas - Tipos de domínio
// ==========================================
// Formato de serialização: SCREAMING_SNAKE_CASE (alinhado ao banco)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Modo de cálculo (Calculation Mode)
// ==========================================
// Regra: determina como o valor por unidade de área de um item é derivado
// - Direct: consumo x valor unitário
// - Yield: preço por embalagem dividido pelo rendimento (consumo é ignorado)
// - Custom: fórmula aritmética autorada pelo administrador
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationMode {
    Direct,
    Yield,
    Custom,
}

impl fmt::Display for CalculationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationMode::Direct => write!(f, "DIRECT"),
            CalculationMode::Yield => write!(f, "YIELD"),
            CalculationMode::Custom => write!(f, "CUSTOM"),
        }
    }
}

impl CalculationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationMode::Direct => "DIRECT",
            CalculationMode::Yield => "YIELD",
            CalculationMode::Custom => "CUSTOM",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DIRECT" => Some(CalculationMode::Direct),
            "YIELD" => Some(CalculationMode::Yield),
            "CUSTOM" => Some(CalculationMode::Custom),
            _ => None,
        }
    }
}

// ==========================================
// Base dimensional (Dimension Basis)
// ==========================================
// Regra: seleciona qual dimensão física do pedido alimenta uma regra de
// material do registro de sistemas
// - Area: área do telhado (m²)
// - RidgeLength: comprimento de cumeeira (m)
// - EavesPerimeter: perímetro de beiral (m)
// - Fixed: quantidade fixa por proposta (independe de dimensão)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DimensionBasis {
    Area,
    RidgeLength,
    EavesPerimeter,
    Fixed,
}

impl fmt::Display for DimensionBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionBasis::Area => write!(f, "AREA"),
            DimensionBasis::RidgeLength => write!(f, "RIDGE_LENGTH"),
            DimensionBasis::EavesPerimeter => write!(f, "EAVES_PERIMETER"),
            DimensionBasis::Fixed => write!(f, "FIXED"),
        }
    }
}

// ==========================================
// Arredondamento comercial
// ==========================================

/// Arredonda um valor para 2 casas decimais
///
/// Aplicado somente na fronteira dos cálculos (nunca no meio),
/// para não acumular erro de arredondamento.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculation_mode_round_trip() {
        for mode in [
            CalculationMode::Direct,
            CalculationMode::Yield,
            CalculationMode::Custom,
        ] {
            assert_eq!(CalculationMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(CalculationMode::from_str("OUTRO"), None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.006), 1.01);
        assert_eq!(round2(4950.0), 4950.0);
        assert_eq!(round2(0.124), 0.12);
        assert_eq!(round2(-1.006), -1.01);
    }
}
