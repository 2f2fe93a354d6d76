// ==========================================
// Portal de Propostas - Camada de domínio
// ==========================================
// Responsabilidade: entidades e tipos de negócio; sem SQL, sem I/O
// ==========================================

pub mod composition;
pub mod product;
pub mod quantitative;
pub mod types;

// Reexportação das entidades centrais
pub use composition::{
    Composition, CompositionLineItem, CompositionView, LineItemInput, LineItemPatch,
    SYNC_TOLERANCE,
};
pub use product::ProductRecord;
pub use quantitative::{
    CalculationRequest, ComputationWarning, QuantitativeItem, QuantitativeOutput,
};
pub use types::{round2, CalculationMode, DimensionBasis};
