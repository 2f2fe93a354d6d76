// ==========================================
// Portal de Propostas - API de proposta quantitativa
// ==========================================
// Responsabilidade: superfície consumida pelos assistentes de proposta
// (dimensões -> lista de materiais orçada)
// ==========================================

use crate::api::error::ApiResult;
use crate::config::engine_config_trait::EngineConfigReader;
use crate::domain::quantitative::{CalculationRequest, ComputationWarning, QuantitativeItem};
use crate::engine::orchestrator::{ComputeOutcome, RequestOrchestrator};
use crate::i18n::{t, t_with_args};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ==========================================
// ProposalQuote - DTO de orçamento
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalQuote {
    pub items: Vec<QuantitativeItem>,
    pub warnings: Vec<ComputationWarning>,
    pub total_value: f64,    // Soma dos totais de linha
    pub from_cache: bool,    // Resultado reaproveitado do cache da sessão
    pub superseded: bool,    // Pedido substituído por entrada mais recente
    pub summary: String,     // Mensagem localizada para a interface
}

// ==========================================
// ProposalApi
// ==========================================
pub struct ProposalApi<C>
where
    C: EngineConfigReader,
{
    orchestrator: Arc<RequestOrchestrator<C>>,
}

impl<C> ProposalApi<C>
where
    C: EngineConfigReader,
{
    pub fn new(orchestrator: Arc<RequestOrchestrator<C>>) -> Self {
        Self { orchestrator }
    }

    /// Computa (ou reaproveita) o orçamento quantitativo de um pedido
    pub async fn compute_quantities(
        &self,
        request: &CalculationRequest,
    ) -> ApiResult<ProposalQuote> {
        match self.orchestrator.get_or_compute(request).await? {
            ComputeOutcome::Superseded => Ok(ProposalQuote {
                items: Vec::new(),
                warnings: Vec::new(),
                total_value: 0.0,
                from_cache: false,
                superseded: true,
                summary: t("quote.superseded"),
            }),
            ComputeOutcome::Completed(response) => {
                let summary = if response.output.is_empty() {
                    t("quote.empty_result")
                } else {
                    t_with_args(
                        "quote.items_priced",
                        &[("count", &response.output.items.len().to_string())],
                    )
                };

                Ok(ProposalQuote {
                    items: response.output.items.clone(),
                    warnings: response.output.warnings.clone(),
                    total_value: response.output.total_value(),
                    from_cache: response.from_cache,
                    superseded: false,
                    summary,
                })
            }
        }
    }
}
