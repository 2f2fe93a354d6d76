// ==========================================
// Portal de Propostas - Pipeline quantitativo
// ==========================================
// Responsabilidade: transformar dimensões físicas + sistema de material
// em lista de materiais categorizada, deduplicada e arredondada para
// embalagens compráveis
// Regra: a resolução sistema -> tipo de proposta é dado (registro),
// nunca branch por sistema dentro do pipeline
// Regra: a deduplicação é salvaguarda de corretude - a mesma peça pode
// ser exigida por duas derivações legítimas (ex.: regra de cumeeira e
// regra de perímetro)
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use crate::config::system_registry::{MaterialRule, SystemDefinition};
use crate::domain::product::ProductRecord;
use crate::domain::quantitative::{
    CalculationRequest, ComputationWarning, QuantitativeItem, QuantitativeOutput,
};
use crate::domain::types::{round2, DimensionBasis};
use crate::engine::error::{EngineError, EngineResult, FieldViolation};
use crate::repository::catalog_repo::CatalogLookup;
use futures::future::try_join_all;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// Janela sanitária do percentual de quebra derivado
const BREAKAGE_SANITY_MIN: f64 = 0.0;
const BREAKAGE_SANITY_MAX: f64 = 50.0;

// ==========================================
// Candidato intermediário (regra resolvida + produto)
// ==========================================
struct Candidate {
    product: ProductRecord,
    net_quantity: f64,
    quantity_with_breakage: f64,
    sort_order: i32,
}

// ==========================================
// QuantitativePipeline
// ==========================================
pub struct QuantitativePipeline<C>
where
    C: EngineConfigReader,
{
    catalog: Arc<dyn CatalogLookup>,
    config: Arc<C>,
}

impl<C> QuantitativePipeline<C>
where
    C: EngineConfigReader,
{
    pub fn new(catalog: Arc<dyn CatalogLookup>, config: Arc<C>) -> Self {
        Self { catalog, config }
    }

    /// Valida um pedido normalizado
    ///
    /// Acumula todas as violações (não interrompe na primeira) para a
    /// interface exibir todos os problemas de uma vez.
    pub async fn validate_request(&self, request: &CalculationRequest) -> EngineResult<()> {
        let area_max = self
            .config
            .get_area_max_m2()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let length_max = self
            .config
            .get_length_max_m()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let registry = self
            .config
            .get_system_registry()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;

        let mut violations = Vec::new();

        if request.sistema_codigo.trim().is_empty() {
            violations.push(FieldViolation::new("sistema_codigo", "obrigatório"));
        } else if registry.resolve(&request.sistema_codigo).is_none() {
            violations.push(FieldViolation::new(
                "sistema_codigo",
                format!(
                    "sistema desconhecido; conhecidos: {}",
                    registry.known_codes().join(", ")
                ),
            ));
        }

        if !(request.area_telhado > 0.0) {
            violations.push(FieldViolation::new(
                "area_telhado",
                "deve ser maior que zero",
            ));
        } else if request.area_telhado > area_max {
            violations.push(FieldViolation::new(
                "area_telhado",
                format!("acima do limite de {} m²", area_max),
            ));
        }

        for (field, value) in [
            ("comprimento_cumeeira", request.comprimento_cumeeira),
            ("perimetro_beiral", request.perimetro_beiral),
        ] {
            if value < 0.0 {
                violations.push(FieldViolation::new(field, "não pode ser negativo"));
            } else if value > length_max {
                violations.push(FieldViolation::new(
                    field,
                    format!("acima do limite de {} m", length_max),
                ));
            }
        }

        if !(0.1..=10.0).contains(&request.fator_correcao) {
            violations.push(FieldViolation::new(
                "fator_correcao",
                "fora do intervalo [0.1, 10]",
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(EngineError::validation(violations))
        }
    }

    /// Computa o orçamento quantitativo de um pedido
    ///
    /// Lista vazia é resultado válido (acompanhada do aviso EmptyResult),
    /// distinto de qualquer erro.
    pub async fn compute_quantities(
        &self,
        request: &CalculationRequest,
        cancel: &CancellationToken,
    ) -> EngineResult<QuantitativeOutput> {
        let request = request.normalized();

        // ==========================================
        // Passo 1: validação (acumula violações)
        // ==========================================
        self.validate_request(&request).await?;

        // ==========================================
        // Passo 2: resolução do sistema de material
        // ==========================================
        let registry = self
            .config
            .get_system_registry()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let system = registry
            .resolve(&request.sistema_codigo)
            .ok_or_else(|| {
                // A validação acima já barrou este caso; defesa contra
                // registro trocado entre as duas leituras
                EngineError::validation(vec![FieldViolation::new(
                    "sistema_codigo",
                    "sistema desconhecido",
                )])
            })?;

        info!(
            sistema_codigo = %system.system_code,
            proposal_type = %system.proposal_type,
            area_telhado = request.area_telhado,
            "iniciando cálculo quantitativo"
        );

        // ==========================================
        // Passo 3: fan-out catálogo + cálculo por regra
        // ==========================================
        let candidates = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            result = self.collect_candidates(&request, system) => result?,
        };

        // ==========================================
        // Passo 4: deduplicação por (código, categoria)
        // ==========================================
        let mut warnings = Vec::new();
        let deduplicated = deduplicate(candidates, &mut warnings);

        // ==========================================
        // Passo 5: embalagens compráveis + quebra derivada
        // ==========================================
        let mut items: Vec<QuantitativeItem> = deduplicated
            .into_iter()
            .map(|c| package_item(c, &mut warnings))
            .collect();

        // ==========================================
        // Passo 6: ordenação (categoria, ordem)
        // ==========================================
        items.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.sort_order.cmp(&b.sort_order))
        });

        // ==========================================
        // Passo 7: resultado
        // ==========================================
        if items.is_empty() {
            warnings.push(ComputationWarning::EmptyResult);
        }

        info!(
            items_count = items.len(),
            warnings_count = warnings.len(),
            "cálculo quantitativo concluído"
        );

        Ok(QuantitativeOutput { items, warnings })
    }

    /// Materializa as regras do sistema em candidatos
    ///
    /// Regras cuja dimensão-base é zero não geram candidato (telhado de
    /// uma água não tem cumeeira).
    async fn collect_candidates(
        &self,
        request: &CalculationRequest,
        system: &SystemDefinition,
    ) -> EngineResult<Vec<Candidate>> {
        let applicable: Vec<&MaterialRule> = system
            .rules
            .iter()
            .filter(|rule| basis_value(request, rule.basis) > 0.0)
            .collect();

        debug!(
            rules_total = system.rules.len(),
            rules_applicable = applicable.len(),
            "regras de material selecionadas"
        );

        let lookups = applicable.iter().map(|rule| {
            let catalog = self.catalog.clone();
            async move {
                catalog
                    .get_product(&rule.product_code)
                    .await
                    .map_err(|e| EngineError::catalog(&rule.product_code, e))
                    .map(|product| (product, *rule))
            }
        });

        let resolved = try_join_all(lookups).await?;

        let candidates = resolved
            .into_iter()
            .map(|(product, rule)| {
                let base = basis_value(request, rule.basis);
                let net_quantity = base
                    * rule.consumption_per_unit
                    * rule.correction_factor
                    * request.fator_correcao;
                let quantity_with_breakage =
                    net_quantity * (1.0 + rule.breakage_percent / 100.0);

                Candidate {
                    product,
                    net_quantity,
                    quantity_with_breakage,
                    sort_order: rule.sort_order,
                }
            })
            .collect();

        Ok(candidates)
    }
}

// ==========================================
// Funções auxiliares do pipeline
// ==========================================

/// Valor da dimensão-base de uma regra
///
/// FIXED usa 1.0: a quantidade absoluta fica no consumo da regra.
fn basis_value(request: &CalculationRequest, basis: DimensionBasis) -> f64 {
    match basis {
        DimensionBasis::Area => request.area_telhado,
        DimensionBasis::RidgeLength => request.comprimento_cumeeira,
        DimensionBasis::EavesPerimeter => request.perimetro_beiral,
        DimensionBasis::Fixed => 1.0,
    }
}

/// Deduplica candidatos por (código, categoria)
///
/// Mantém a derivação de menor sort_order e emite aviso estruturado por
/// duplicata descartada em vez de engolir silenciosamente.
fn deduplicate(
    candidates: Vec<Candidate>,
    warnings: &mut Vec<ComputationWarning>,
) -> Vec<Candidate> {
    let mut kept: HashMap<(String, String), Candidate> = HashMap::new();
    let mut order: Vec<(String, String)> = Vec::new();

    for candidate in candidates {
        let key = (
            candidate.product.code.clone(),
            candidate.product.category.clone(),
        );
        match kept.entry(key.clone()) {
            Entry::Vacant(slot) => {
                order.push(key);
                slot.insert(candidate);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                let (winner_order, loser_order) = if candidate.sort_order < existing.sort_order {
                    let loser = std::mem::replace(&mut *existing, candidate);
                    (existing.sort_order, loser.sort_order)
                } else {
                    (existing.sort_order, candidate.sort_order)
                };

                warn!(
                    code = %key.0,
                    category = %key.1,
                    kept_sort_order = winner_order,
                    discarded_sort_order = loser_order,
                    "duplicata descartada na deduplicação"
                );
                warnings.push(ComputationWarning::DuplicateDiscarded {
                    code: key.0.clone(),
                    category: key.1.clone(),
                    kept_sort_order: winner_order,
                    discarded_sort_order: loser_order,
                });
            }
        }
    }

    // Preserva a ordem de primeira ocorrência (determinismo)
    order
        .into_iter()
        .filter_map(|key| kept.remove(&key))
        .collect()
}

/// Converte um candidato em item de orçamento com embalagens inteiras
///
/// breakage_percent é derivado de líquida vs. com quebra (a quebra pode
/// ter sido aplicada em mais de um ponto a montante), nunca reaproveitado
/// da entrada.
fn package_item(candidate: Candidate, warnings: &mut Vec<ComputationWarning>) -> QuantitativeItem {
    let package_size = if candidate.product.package_size > 0.0 {
        candidate.product.package_size
    } else {
        1.0
    };

    // Tolerância de ponto flutuante: 100 x 1.1 chega como
    // 110.00000000000001 e não pode virar 111 embalagens
    let packages_exact = candidate.quantity_with_breakage / package_size;
    let package_count = (packages_exact - 1e-9).ceil().max(0.0) as i64;
    let line_total = round2(package_count as f64 * candidate.product.unit_price);

    let breakage_percent = if candidate.net_quantity > 0.0 {
        round2(
            (candidate.quantity_with_breakage - candidate.net_quantity) / candidate.net_quantity
                * 100.0,
        )
    } else {
        0.0
    };

    if package_count == 0 {
        warnings.push(ComputationWarning::ZeroQuantity {
            code: candidate.product.code.clone(),
        });
    }
    if candidate.product.unit_price == 0.0 {
        warnings.push(ComputationWarning::ZeroPrice {
            code: candidate.product.code.clone(),
        });
    }
    if !(BREAKAGE_SANITY_MIN..=BREAKAGE_SANITY_MAX).contains(&breakage_percent) {
        warnings.push(ComputationWarning::BreakageOutlier {
            code: candidate.product.code.clone(),
            breakage_percent,
        });
    }

    QuantitativeItem {
        code: candidate.product.code,
        description: candidate.product.description,
        category: candidate.product.category,
        net_quantity: round2(candidate.net_quantity),
        breakage_percent,
        quantity_with_breakage: round2(candidate.quantity_with_breakage),
        sales_unit: candidate.product.unit_of_measure,
        package_count,
        unit_price: candidate.product.unit_price,
        line_total,
        sort_order: candidate.sort_order,
    }
}
