// ==========================================
// Portal de Propostas - Agregador de composições
// ==========================================
// Responsabilidade: ciclo de vida dos itens de uma composição e do
// total por m² (adicionar/editar/remover/reordenar/recompor)
// Regra: falha de catálogo aborta somente a operação corrente; nada
// parcial é persistido e os itens já gravados permanecem íntegros
// Regra: o total em cache só muda via recompute_total
// ==========================================

use crate::domain::composition::{
    Composition, CompositionLineItem, CompositionView, LineItemInput, LineItemPatch,
};
use crate::domain::types::{round2, CalculationMode};
use crate::engine::error::{EngineError, EngineResult, FieldViolation};
use crate::engine::unit_calculator::compute_line_value;
use crate::repository::catalog_repo::CatalogLookup;
use crate::repository::composition_repo::CompositionRepository;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

// ==========================================
// Validação de parâmetros de item
// ==========================================

fn validate_item_params(
    consumption_per_unit_area: f64,
    breakage_percent: f64,
    correction_factor: f64,
    calculation_mode: CalculationMode,
    custom_formula: Option<&str>,
) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if !(consumption_per_unit_area > 0.0) {
        violations.push(FieldViolation::new(
            "consumption_per_unit_area",
            "deve ser maior que zero",
        ));
    }
    if !(0.0..=50.0).contains(&breakage_percent) {
        violations.push(FieldViolation::new(
            "breakage_percent",
            "fora do intervalo [0, 50]",
        ));
    }
    if !(0.1..=10.0).contains(&correction_factor) {
        violations.push(FieldViolation::new(
            "correction_factor",
            "fora do intervalo [0.1, 10]",
        ));
    }

    let has_formula = custom_formula.map(|f| !f.trim().is_empty()).unwrap_or(false);
    match calculation_mode {
        CalculationMode::Custom if !has_formula => {
            violations.push(FieldViolation::new(
                "custom_formula",
                "obrigatória no modo CUSTOM",
            ));
        }
        CalculationMode::Direct | CalculationMode::Yield if has_formula => {
            violations.push(FieldViolation::new(
                "custom_formula",
                "permitida somente no modo CUSTOM",
            ));
        }
        _ => {}
    }

    violations
}

// ==========================================
// CompositionAggregator
// ==========================================
pub struct CompositionAggregator {
    repo: Arc<CompositionRepository>,
    catalog: Arc<dyn CatalogLookup>,
}

impl CompositionAggregator {
    /// Cria o agregador sobre o repositório e o catálogo injetados
    pub fn new(repo: Arc<CompositionRepository>, catalog: Arc<dyn CatalogLookup>) -> Self {
        Self { repo, catalog }
    }

    // ==========================================
    // Operações de composição
    // ==========================================

    /// Cria uma composição vazia
    pub fn create_composition(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> EngineResult<Composition> {
        let composition = self.repo.create_composition(name, description)?;
        info!(composition_id = %composition.composition_id, name = %name, "composição criada");
        Ok(composition)
    }

    /// Lê uma composição com itens ordenados e flag de sincronização
    pub fn get_composition(&self, composition_id: &str) -> EngineResult<CompositionView> {
        let composition = self.require_composition(composition_id)?;
        let items = self.repo.list_items(composition_id)?;
        let items_sum = round2(items.iter().map(|i| i.value_per_unit_area).sum());
        let synchronized = composition.is_synchronized(items_sum);

        Ok(CompositionView {
            composition,
            items,
            items_sum,
            synchronized,
        })
    }

    /// Lista todas as composições
    pub fn list_compositions(&self) -> EngineResult<Vec<Composition>> {
        Ok(self.repo.list_compositions()?)
    }

    /// Exclui uma composição (itens removidos em cascata)
    pub fn delete_composition(&self, composition_id: &str) -> EngineResult<()> {
        let deleted = self.repo.delete_composition(composition_id)?;
        if !deleted {
            return Err(EngineError::NotFound {
                entity: "Composition".to_string(),
                id: composition_id.to_string(),
            });
        }
        info!(composition_id = %composition_id, "composição excluída");
        Ok(())
    }

    // ==========================================
    // Operações de item
    // ==========================================

    /// Adiciona um item à composição
    ///
    /// Ordem: max(ordem existente) + 1, salvo ordem explícita do chamador.
    /// Dispara recompute_total.
    pub async fn add_item(
        &self,
        composition_id: &str,
        input: LineItemInput,
    ) -> EngineResult<CompositionLineItem> {
        self.require_composition(composition_id)?;

        let violations = validate_item_params(
            input.consumption_per_unit_area,
            input.breakage_percent,
            input.correction_factor,
            input.calculation_mode,
            input.custom_formula.as_deref(),
        );
        if !violations.is_empty() {
            return Err(EngineError::validation(violations));
        }

        // Falha de catálogo aborta aqui; nada foi persistido
        let product = self
            .catalog
            .get_product(&input.product_code)
            .await
            .map_err(|e| EngineError::catalog(&input.product_code, e))?;

        let value = compute_line_value(
            &product,
            input.consumption_per_unit_area,
            input.breakage_percent,
            input.correction_factor,
            input.calculation_mode,
            input.custom_formula.as_deref(),
        )?;

        let item_order = match input.item_order {
            Some(order) => order,
            None => self.repo.max_item_order(composition_id)?.unwrap_or(0) + 1,
        };

        let now = Utc::now();
        let item = CompositionLineItem {
            item_id: Uuid::new_v4().to_string(),
            composition_id: composition_id.to_string(),
            product_code: input.product_code,
            consumption_per_unit_area: input.consumption_per_unit_area,
            breakage_percent: input.breakage_percent,
            correction_factor: input.correction_factor,
            calculation_mode: input.calculation_mode,
            custom_formula: input.custom_formula,
            item_order,
            unit_value: value.unit_value,
            value_per_unit_area: value.value_per_unit_area,
            created_at: now,
            updated_at: now,
        };

        self.repo.insert_item(&item)?;
        let total = self.recompute_total(composition_id)?;

        info!(
            composition_id = %composition_id,
            item_id = %item.item_id,
            product_code = %item.product_code,
            value_per_unit_area = item.value_per_unit_area,
            total_value_per_unit_area = total,
            "item adicionado"
        );

        Ok(item)
    }

    /// Edita um item (merge parcial)
    ///
    /// Os valores derivados são recalculados contra o preço corrente de
    /// catálogo, não contra o preço da criação. Dispara recompute_total.
    pub async fn edit_item(
        &self,
        item_id: &str,
        patch: LineItemPatch,
    ) -> EngineResult<CompositionLineItem> {
        let mut item = self.require_item(item_id)?;

        // Merge dos campos presentes
        if let Some(product_code) = patch.product_code {
            item.product_code = product_code;
        }
        if let Some(consumption) = patch.consumption_per_unit_area {
            item.consumption_per_unit_area = consumption;
        }
        if let Some(breakage) = patch.breakage_percent {
            item.breakage_percent = breakage;
        }
        if let Some(factor) = patch.correction_factor {
            item.correction_factor = factor;
        }
        if let Some(mode) = patch.calculation_mode {
            item.calculation_mode = mode;
        }
        if let Some(formula) = patch.custom_formula {
            item.custom_formula = formula;
        }

        let violations = validate_item_params(
            item.consumption_per_unit_area,
            item.breakage_percent,
            item.correction_factor,
            item.calculation_mode,
            item.custom_formula.as_deref(),
        );
        if !violations.is_empty() {
            return Err(EngineError::validation(violations));
        }

        let product = self
            .catalog
            .get_product(&item.product_code)
            .await
            .map_err(|e| EngineError::catalog(&item.product_code, e))?;

        let value = compute_line_value(
            &product,
            item.consumption_per_unit_area,
            item.breakage_percent,
            item.correction_factor,
            item.calculation_mode,
            item.custom_formula.as_deref(),
        )?;

        item.unit_value = value.unit_value;
        item.value_per_unit_area = value.value_per_unit_area;
        item.updated_at = Utc::now();

        self.repo.update_item(&item)?;
        self.recompute_total(&item.composition_id)?;

        debug!(item_id = %item_id, "item editado");
        Ok(item)
    }

    /// Remove um item
    ///
    /// As ordens remanescentes não são renumeradas (lacunas permitidas).
    /// Dispara recompute_total.
    pub fn remove_item(&self, item_id: &str) -> EngineResult<()> {
        let item = self.require_item(item_id)?;
        self.repo.delete_item(item_id)?;
        self.recompute_total(&item.composition_id)?;
        debug!(item_id = %item_id, composition_id = %item.composition_id, "item removido");
        Ok(())
    }

    /// Reordena itens em lote
    ///
    /// Não recalcula valores: ordem não afeta valor.
    pub fn reorder(
        &self,
        composition_id: &str,
        pairs: &[(String, i32)],
    ) -> EngineResult<usize> {
        self.require_composition(composition_id)?;
        let updated = self.repo.update_item_orders(composition_id, pairs)?;
        debug!(composition_id = %composition_id, updated = updated, "itens reordenados");
        Ok(updated)
    }

    /// Recalcula todos os itens contra o catálogo vivo
    ///
    /// Persiste somente itens cujo valor mudou mais que 0.01 (evita
    /// escrita desnecessária).
    ///
    /// # Retorno
    /// - quantidade de itens efetivamente alterados
    pub async fn refresh_from_catalog(&self, composition_id: &str) -> EngineResult<usize> {
        self.require_composition(composition_id)?;
        let items = self.repo.list_items(composition_id)?;
        let mut changed = 0usize;

        for item in &items {
            let product = self
                .catalog
                .get_product(&item.product_code)
                .await
                .map_err(|e| EngineError::catalog(&item.product_code, e))?;

            let value = compute_line_value(
                &product,
                item.consumption_per_unit_area,
                item.breakage_percent,
                item.correction_factor,
                item.calculation_mode,
                item.custom_formula.as_deref(),
            )?;

            let drifted = (value.value_per_unit_area - item.value_per_unit_area).abs() > 0.01
                || (value.unit_value - item.unit_value).abs() > 0.01;
            if drifted {
                self.repo.update_item_values(
                    &item.item_id,
                    value.unit_value,
                    value.value_per_unit_area,
                    Utc::now(),
                )?;
                changed += 1;
            }
        }

        if changed > 0 {
            self.recompute_total(composition_id)?;
        }

        info!(
            composition_id = %composition_id,
            items_count = items.len(),
            changed = changed,
            "refresh de catálogo concluído"
        );

        Ok(changed)
    }

    /// Recalcula o total por m² da composição (valor autoritativo)
    ///
    /// O total em cache é considerado desatualizado até esta execução;
    /// a flag synchronized existe para expor isso, nunca para corrigir.
    pub fn recompute_total(&self, composition_id: &str) -> EngineResult<f64> {
        let items = self.repo.list_items(composition_id)?;
        let total = round2(items.iter().map(|i| i.value_per_unit_area).sum());
        self.repo.update_cached_total(composition_id, total)?;
        Ok(total)
    }

    // ==========================================
    // Auxiliares internos
    // ==========================================

    fn require_composition(&self, composition_id: &str) -> EngineResult<Composition> {
        self.repo
            .find_composition(composition_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "Composition".to_string(),
                id: composition_id.to_string(),
            })
    }

    fn require_item(&self, item_id: &str) -> EngineResult<CompositionLineItem> {
        self.repo
            .find_item(item_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "CompositionLineItem".to_string(),
                id: item_id.to_string(),
            })
    }
}
