// ==========================================
// Portal de Propostas - Camada de API
// ==========================================
// Responsabilidade: superfícies de negócio consumidas pela interface
// (assistentes de proposta e telas administrativas)
// ==========================================

pub mod composition_api;
pub mod error;
pub mod proposal_api;

pub use composition_api::CompositionApi;
pub use error::{ApiError, ApiResult};
pub use proposal_api::{ProposalApi, ProposalQuote};
