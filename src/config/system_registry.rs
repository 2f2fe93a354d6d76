// ==========================================
// Portal de Propostas - Registro de sistemas de material
// ==========================================
// Responsabilidade: mapear código de sistema -> tipo de proposta +
// regras de material orientadas a dados
// Regra: adicionar um sistema é dado (nova entrada no registro),
// nunca um novo branch no pipeline
// Armazenamento: config_kv, chave "system_registry" (JSON)
// ==========================================

use crate::domain::types::{CalculationMode, DimensionBasis};
use serde::{Deserialize, Serialize};

fn default_one() -> f64 {
    1.0
}

fn default_mode() -> CalculationMode {
    CalculationMode::Direct
}

// ==========================================
// MaterialRule - Regra de material
// ==========================================
// Uso: uma regra gera no máximo um item candidato; a quantidade líquida
// vem da dimensão selecionada pela base x consumo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRule {
    pub product_code: String,       // Código de catálogo
    pub basis: DimensionBasis,      // Dimensão do pedido que alimenta a regra
    pub consumption_per_unit: f64,  // Unidades de produto por unidade da base
    pub breakage_percent: f64,      // Quebra aplicada sobre a quantidade líquida
    #[serde(default = "default_one")]
    pub correction_factor: f64,     // Multiplicador adicional (padrão 1.0)
    #[serde(default = "default_mode")]
    pub calculation_mode: CalculationMode,
    pub sort_order: i32,            // Prioridade (menor vence na deduplicação)
}

// ==========================================
// SystemDefinition - Definição de sistema
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDefinition {
    pub system_code: String,   // Código do sistema (ex.: "SH-RES")
    pub proposal_type: String, // Tag do tipo de proposta (ex.: "TELHADO_SHINGLE")
    pub description: String,
    pub rules: Vec<MaterialRule>,
}

// ==========================================
// SystemRegistry - Registro de sistemas
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemRegistry {
    pub systems: Vec<SystemDefinition>,
}

impl SystemRegistry {
    /// Resolve um código de sistema (case-insensitive, sem espaços laterais)
    pub fn resolve(&self, system_code: &str) -> Option<&SystemDefinition> {
        let canonical = system_code.trim().to_uppercase();
        self.systems
            .iter()
            .find(|s| s.system_code.eq_ignore_ascii_case(&canonical))
    }

    /// Códigos de sistema conhecidos (para mensagens de validação)
    pub fn known_codes(&self) -> Vec<String> {
        self.systems.iter().map(|s| s.system_code.clone()).collect()
    }

    /// Serializa o registro para armazenamento em config_kv
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Reconstrói o registro a partir do JSON armazenado
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Registro semeado com os sistemas comercializados
    ///
    /// Consumos em unidade de produto por unidade da base (ex.: placas
    /// OSB por m² de telhado). Ajustes finos entram pelo config_kv.
    pub fn default_registry() -> Self {
        Self {
            systems: vec![
                SystemDefinition {
                    system_code: "SH-RES".to_string(),
                    proposal_type: "TELHADO_SHINGLE".to_string(),
                    description: "Telhado shingle residencial".to_string(),
                    rules: vec![
                        MaterialRule {
                            product_code: "OSB-11".to_string(),
                            basis: DimensionBasis::Area,
                            consumption_per_unit: 0.37,
                            breakage_percent: 10.0,
                            correction_factor: 1.0,
                            calculation_mode: CalculationMode::Direct,
                            sort_order: 1,
                        },
                        MaterialRule {
                            product_code: "MANTA-SUB".to_string(),
                            basis: DimensionBasis::Area,
                            consumption_per_unit: 0.023,
                            breakage_percent: 5.0,
                            correction_factor: 1.0,
                            calculation_mode: CalculationMode::Direct,
                            sort_order: 2,
                        },
                        MaterialRule {
                            product_code: "TELHA-SH".to_string(),
                            basis: DimensionBasis::Area,
                            consumption_per_unit: 0.323,
                            breakage_percent: 8.0,
                            correction_factor: 1.0,
                            calculation_mode: CalculationMode::Direct,
                            sort_order: 3,
                        },
                        MaterialRule {
                            product_code: "PREGO-17".to_string(),
                            basis: DimensionBasis::Area,
                            consumption_per_unit: 0.012,
                            breakage_percent: 0.0,
                            correction_factor: 1.0,
                            calculation_mode: CalculationMode::Direct,
                            sort_order: 4,
                        },
                        MaterialRule {
                            product_code: "CUMEEIRA-SH".to_string(),
                            basis: DimensionBasis::RidgeLength,
                            consumption_per_unit: 0.333,
                            breakage_percent: 10.0,
                            correction_factor: 1.0,
                            calculation_mode: CalculationMode::Direct,
                            sort_order: 5,
                        },
                        // Pregos também exigidos pela regra de cumeeira;
                        // a deduplicação mantém a derivação de menor ordem
                        MaterialRule {
                            product_code: "PREGO-17".to_string(),
                            basis: DimensionBasis::RidgeLength,
                            consumption_per_unit: 0.05,
                            breakage_percent: 0.0,
                            correction_factor: 1.0,
                            calculation_mode: CalculationMode::Direct,
                            sort_order: 6,
                        },
                        MaterialRule {
                            product_code: "DRIP-BEIRAL".to_string(),
                            basis: DimensionBasis::EavesPerimeter,
                            consumption_per_unit: 0.5,
                            breakage_percent: 5.0,
                            correction_factor: 1.0,
                            calculation_mode: CalculationMode::Direct,
                            sort_order: 7,
                        },
                    ],
                },
                SystemDefinition {
                    system_code: "SH-PREM".to_string(),
                    proposal_type: "TELHADO_SHINGLE_PREMIUM".to_string(),
                    description: "Telhado shingle premium (manta aluminizada)".to_string(),
                    rules: vec![
                        MaterialRule {
                            product_code: "OSB-18".to_string(),
                            basis: DimensionBasis::Area,
                            consumption_per_unit: 0.37,
                            breakage_percent: 10.0,
                            correction_factor: 1.0,
                            calculation_mode: CalculationMode::Direct,
                            sort_order: 1,
                        },
                        MaterialRule {
                            product_code: "MANTA-ALU".to_string(),
                            basis: DimensionBasis::Area,
                            consumption_per_unit: 0.025,
                            breakage_percent: 5.0,
                            correction_factor: 1.0,
                            calculation_mode: CalculationMode::Direct,
                            sort_order: 2,
                        },
                        MaterialRule {
                            product_code: "TELHA-SH-PREM".to_string(),
                            basis: DimensionBasis::Area,
                            consumption_per_unit: 0.323,
                            breakage_percent: 8.0,
                            correction_factor: 1.0,
                            calculation_mode: CalculationMode::Direct,
                            sort_order: 3,
                        },
                        MaterialRule {
                            product_code: "PREGO-17".to_string(),
                            basis: DimensionBasis::Area,
                            consumption_per_unit: 0.012,
                            breakage_percent: 0.0,
                            correction_factor: 1.0,
                            calculation_mode: CalculationMode::Direct,
                            sort_order: 4,
                        },
                        MaterialRule {
                            product_code: "CUMEEIRA-SH-PREM".to_string(),
                            basis: DimensionBasis::RidgeLength,
                            consumption_per_unit: 0.333,
                            breakage_percent: 10.0,
                            correction_factor: 1.0,
                            calculation_mode: CalculationMode::Direct,
                            sort_order: 5,
                        },
                    ],
                },
            ],
        }
    }
}
