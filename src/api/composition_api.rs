// ==========================================
// Portal de Propostas - API de composições
// ==========================================
// Responsabilidade: superfície CRUD consumida pelas telas
// administrativas de composição
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::composition::{
    Composition, CompositionLineItem, CompositionView, LineItemInput, LineItemPatch,
};
use crate::engine::aggregator::CompositionAggregator;
use std::sync::Arc;

// ==========================================
// CompositionApi
// ==========================================
pub struct CompositionApi {
    aggregator: Arc<CompositionAggregator>,
}

impl CompositionApi {
    pub fn new(aggregator: Arc<CompositionAggregator>) -> Self {
        Self { aggregator }
    }

    /// Cria uma composição vazia
    pub fn create_composition(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> ApiResult<Composition> {
        Ok(self.aggregator.create_composition(name, description)?)
    }

    /// Lê uma composição com itens e flag de sincronização
    pub fn get_composition(&self, composition_id: &str) -> ApiResult<CompositionView> {
        Ok(self.aggregator.get_composition(composition_id)?)
    }

    /// Lista todas as composições
    pub fn list_compositions(&self) -> ApiResult<Vec<Composition>> {
        Ok(self.aggregator.list_compositions()?)
    }

    /// Exclui uma composição (itens em cascata)
    pub fn delete_composition(&self, composition_id: &str) -> ApiResult<()> {
        Ok(self.aggregator.delete_composition(composition_id)?)
    }

    /// Adiciona um item e recalcula o total
    pub async fn add_item(
        &self,
        composition_id: &str,
        input: LineItemInput,
    ) -> ApiResult<CompositionLineItem> {
        Ok(self.aggregator.add_item(composition_id, input).await?)
    }

    /// Edita um item (merge parcial) e recalcula o total
    pub async fn edit_item(
        &self,
        item_id: &str,
        patch: LineItemPatch,
    ) -> ApiResult<CompositionLineItem> {
        Ok(self.aggregator.edit_item(item_id, patch).await?)
    }

    /// Remove um item e recalcula o total
    pub fn remove_item(&self, item_id: &str) -> ApiResult<()> {
        Ok(self.aggregator.remove_item(item_id)?)
    }

    /// Reordena itens em lote (sem recálculo de valores)
    pub fn reorder(&self, composition_id: &str, pairs: &[(String, i32)]) -> ApiResult<usize> {
        Ok(self.aggregator.reorder(composition_id, pairs)?)
    }

    /// Recalcula os itens contra o catálogo vivo
    ///
    /// # Retorno
    /// - quantidade de itens efetivamente alterados
    pub async fn refresh_from_catalog(&self, composition_id: &str) -> ApiResult<usize> {
        Ok(self.aggregator.refresh_from_catalog(composition_id).await?)
    }

    /// Recalcula o total por m² (valor autoritativo)
    pub fn recompute_total(&self, composition_id: &str) -> ApiResult<f64> {
        Ok(self.aggregator.recompute_total(composition_id)?)
    }
}
