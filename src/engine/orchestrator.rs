// ==========================================
// Portal de Propostas - Orquestrador de pedidos
// ==========================================
// Responsabilidade: proteger o pipeline contra entrada interativa
// rápida - cache por fingerprint, single-flight, debounce, timeout e
// cancelamento
// Regra: estado explícito por sessão/formulário (nada de singleton de
// processo); o cache é append-only e nunca recebe resultado de cálculo
// falho, cancelado ou superado
// Regra: o guard de single-flight é liberado em todos os caminhos de
// saída (sucesso, erro, timeout, supersessão)
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use crate::domain::quantitative::{CalculationRequest, QuantitativeOutput};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::pipeline::QuantitativePipeline;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// Resultado compartilhado com os chamadores em espera do single-flight
type FlightResult = Result<Arc<QuantitativeOutput>, EngineError>;

// ==========================================
// OrchestratorSettings - Janelas de proteção
// ==========================================
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub debounce_window: Duration,
    pub computation_timeout: Duration,
}

impl OrchestratorSettings {
    /// Carrega as janelas a partir da configuração
    pub async fn from_config<C: EngineConfigReader>(config: &C) -> EngineResult<Self> {
        let debounce_ms = config
            .get_debounce_window_ms()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let timeout_ms = config
            .get_computation_timeout_ms()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;

        Ok(Self {
            debounce_window: Duration::from_millis(debounce_ms),
            computation_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

// ==========================================
// ComputeResponse / ComputeOutcome
// ==========================================

/// Resposta de um cálculo concluído
#[derive(Debug, Clone)]
pub struct ComputeResponse {
    pub output: Arc<QuantitativeOutput>,
    pub from_cache: bool,
}

/// Desfecho de get_or_compute
///
/// Superseded não é falha: o pedido foi substituído por entrada mais
/// recente do mesmo formulário e o chamador simplesmente descarta.
#[derive(Debug, Clone)]
pub enum ComputeOutcome {
    Completed(ComputeResponse),
    Superseded,
}

// ==========================================
// Estado compartilhado (único estado mutável do orquestrador)
// ==========================================
struct OrchestratorState {
    // Cache por fingerprint - entradas nunca são alteradas, só inseridas
    cache: HashMap<String, Arc<QuantitativeOutput>>,
    // Cálculos em voo por fingerprint (fan-out para os que esperam)
    in_flight: HashMap<String, watch::Receiver<Option<FlightResult>>>,
    // Token do cálculo corrente (cancelado por pedidos mais novos)
    current_cancel: Option<CancellationToken>,
}

// ==========================================
// RequestOrchestrator
// ==========================================
pub struct RequestOrchestrator<C>
where
    C: EngineConfigReader,
{
    pipeline: Arc<QuantitativePipeline<C>>,
    settings: OrchestratorSettings,
    state: Mutex<OrchestratorState>,
    generation: AtomicU64,
}

impl<C> RequestOrchestrator<C>
where
    C: EngineConfigReader,
{
    /// Cria um orquestrador por sessão/formulário
    pub fn new(pipeline: Arc<QuantitativePipeline<C>>, settings: OrchestratorSettings) -> Self {
        Self {
            pipeline,
            settings,
            state: Mutex::new(OrchestratorState {
                cache: HashMap::new(),
                in_flight: HashMap::new(),
                current_cancel: None,
            }),
            generation: AtomicU64::new(0),
        }
    }

    fn lock_state(&self) -> EngineResult<std::sync::MutexGuard<'_, OrchestratorState>> {
        self.state
            .lock()
            .map_err(|e| EngineError::Internal(format!("falha de lock do orquestrador: {}", e)))
    }

    /// Retorna do cache ou computa com proteção completa
    ///
    /// Sequência: validação -> cache -> debounce -> single-flight ->
    /// timeout/cancelamento -> commit em ordem de submissão.
    pub async fn get_or_compute(&self, request: &CalculationRequest) -> EngineResult<ComputeOutcome> {
        let request = request.normalized();

        // Pedido inválido falha antes de tocar cache ou pipeline
        self.pipeline.validate_request(&request).await?;

        let fingerprint = request.fingerprint();

        // ==========================================
        // Cache: mesma pergunta, resposta imediata
        // ==========================================
        if let Some(hit) = self.cache_get(&fingerprint)? {
            debug!(fingerprint = %fingerprint, "cache hit");
            return Ok(ComputeOutcome::Completed(ComputeResponse {
                output: hit,
                from_cache: true,
            }));
        }

        // ==========================================
        // Debounce: rajadas colapsam para o último pedido
        // ==========================================
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.settings.debounce_window.is_zero() {
            tokio::time::sleep(self.settings.debounce_window).await;
        }
        if self.generation.load(Ordering::SeqCst) != my_generation {
            debug!(fingerprint = %fingerprint, "pedido superado na janela de debounce");
            return Ok(ComputeOutcome::Superseded);
        }

        // ==========================================
        // Single-flight: aguarda cálculo em voo do mesmo fingerprint
        // ==========================================
        let (flight_tx, cancel) = {
            let mut state = self.lock_state()?;

            // Outro pedido idêntico pode ter concluído durante o debounce
            if let Some(hit) = state.cache.get(&fingerprint) {
                return Ok(ComputeOutcome::Completed(ComputeResponse {
                    output: hit.clone(),
                    from_cache: true,
                }));
            }

            if let Some(rx) = state.in_flight.get(&fingerprint) {
                let rx = rx.clone();
                drop(state);
                debug!(fingerprint = %fingerprint, "aguardando cálculo em voo");
                return self.await_in_flight(rx).await;
            }

            // Registra o voo e cancela o cálculo anterior (superado)
            let (tx, rx) = watch::channel(None);
            state.in_flight.insert(fingerprint.clone(), rx);

            if let Some(previous) = state.current_cancel.take() {
                previous.cancel();
            }
            let cancel = CancellationToken::new();
            state.current_cancel = Some(cancel.clone());

            (tx, cancel)
        };

        // ==========================================
        // Execução com timeout
        // ==========================================
        let timeout = self.settings.computation_timeout;
        let computed = tokio::time::timeout(
            timeout,
            self.pipeline.compute_quantities(&request, &cancel),
        )
        .await;

        let flight_result: FlightResult = match computed {
            Err(_elapsed) => {
                // Cálculo abandonado; o token impede efeito tardio
                cancel.cancel();
                warn!(
                    fingerprint = %fingerprint,
                    timeout_ms = timeout.as_millis() as u64,
                    "cálculo excedeu o tempo máximo"
                );
                Err(EngineError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
            Ok(Err(e)) => Err(e),
            Ok(Ok(output)) => Ok(Arc::new(output)),
        };

        // ==========================================
        // Liberação do guard + commit (todos os caminhos de saída)
        // ==========================================
        let superseded = cancel.is_cancelled()
            && !matches!(flight_result, Err(EngineError::Timeout { .. }));
        {
            let mut state = self.lock_state()?;
            state.in_flight.remove(&fingerprint);

            if let Ok(output) = &flight_result {
                if superseded {
                    // Resultado obsoleto jamais sobrescreve um mais novo
                    debug!(fingerprint = %fingerprint, "resultado superado descartado do cache");
                } else {
                    state.cache.insert(fingerprint.clone(), output.clone());
                    info!(fingerprint = %fingerprint, "resultado gravado no cache da sessão");
                }
            }
        }

        // Fan-out para os chamadores em espera (mesmo fingerprint,
        // resultado igualmente válido para eles)
        flight_tx.send_replace(Some(flight_result.clone()));

        if superseded {
            return Ok(ComputeOutcome::Superseded);
        }

        flight_result.map(|output| {
            ComputeOutcome::Completed(ComputeResponse {
                output,
                from_cache: false,
            })
        })
    }

    /// Quantidade de entradas no cache (inspeção/testes)
    pub fn cache_len(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.cache.len(),
            Err(poisoned) => poisoned.into_inner().cache.len(),
        }
    }

    // ==========================================
    // Auxiliares internos
    // ==========================================

    fn cache_get(&self, fingerprint: &str) -> EngineResult<Option<Arc<QuantitativeOutput>>> {
        let state = self.lock_state()?;
        Ok(state.cache.get(fingerprint).cloned())
    }

    /// Aguarda o resultado de um cálculo em voo e o distribui
    async fn await_in_flight(
        &self,
        mut rx: watch::Receiver<Option<FlightResult>>,
    ) -> EngineResult<ComputeOutcome> {
        let shared = rx
            .wait_for(|value| value.is_some())
            .await
            .map_err(|_| EngineError::Internal("cálculo em voo abortado sem resultado".to_string()))?
            .clone();

        match shared {
            Some(Ok(output)) => Ok(ComputeOutcome::Completed(ComputeResponse {
                output,
                from_cache: false,
            })),
            // O voo foi cancelado por entrada mais nova: quem espera
            // também foi superado
            Some(Err(EngineError::Cancelled)) => Ok(ComputeOutcome::Superseded),
            Some(Err(e)) => Err(e),
            // wait_for garante Some; braço defensivo
            None => Err(EngineError::Internal(
                "cálculo em voo sem resultado".to_string(),
            )),
        }
    }
}
