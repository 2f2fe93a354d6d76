// ==========================================
// Testes de integração do pipeline quantitativo
// ==========================================
// Cobertura: validação acumulada, deduplicação, embalagens compráveis,
// ordenação, determinismo e resultado vazio
// ==========================================

mod helpers;

use helpers::mock_config::MockConfig;
use helpers::test_data_builder::{
    registry_with_rules, shingle_catalog, RequestBuilder, RuleBuilder,
};
use orcamento_engine::domain::{ComputationWarning, DimensionBasis};
use orcamento_engine::engine::{EngineError, QuantitativePipeline};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn pipeline_with(
    registry: orcamento_engine::config::SystemRegistry,
) -> QuantitativePipeline<MockConfig> {
    QuantitativePipeline::new(
        Arc::new(shingle_catalog()),
        Arc::new(MockConfig::with_registry(registry)),
    )
}

// ==========================================
// Quebra de 10% sobre 100 m² fecha em embalagens inteiras
// ==========================================
#[tokio::test]
async fn test_breakage_and_package_rounding_on_full_area() {
    let registry = registry_with_rules(
        "SH-TEST",
        vec![RuleBuilder::new("OSB-11")
            .consumption(1.0)
            .breakage(10.0)
            .sort_order(1)
            .build()],
    );
    let pipeline = pipeline_with(registry);
    let request = RequestBuilder::new("SH-TEST", 100.0).build();

    let output = pipeline
        .compute_quantities(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.items.len(), 1);
    let item = &output.items[0];
    assert_eq!(item.code, "OSB-11");
    assert_eq!(item.net_quantity, 100.0);
    assert_eq!(item.quantity_with_breakage, 110.0);
    assert_eq!(item.breakage_percent, 10.0);
    assert_eq!(item.package_count, 110);
    assert_eq!(item.line_total, 4950.0);
    assert_eq!(output.total_value(), 4950.0);
}

// ==========================================
// Consumo fracionário arredonda embalagem para cima
// ==========================================
#[tokio::test]
async fn test_fractional_quantity_rounds_up_to_full_package() {
    let registry = registry_with_rules(
        "SH-TEST",
        vec![RuleBuilder::new("OSB-11")
            .consumption(1.0)
            .breakage(0.0)
            .sort_order(1)
            .build()],
    );
    let pipeline = pipeline_with(registry);
    let request = RequestBuilder::new("SH-TEST", 0.5).build();

    let output = pipeline
        .compute_quantities(&request, &CancellationToken::new())
        .await
        .unwrap();

    let item = &output.items[0];
    assert_eq!(item.quantity_with_breakage, 0.5);
    assert_eq!(item.package_count, 1);
    assert_eq!(item.line_total, 45.0);
}

// ==========================================
// Duas derivações do mesmo material colapsam em uma
// ==========================================
#[tokio::test]
async fn test_dedup_keeps_lowest_sort_order_and_warns() {
    let registry = registry_with_rules(
        "SH-TEST",
        vec![
            RuleBuilder::new("PREGO-17")
                .consumption(0.1)
                .sort_order(3)
                .build(),
            RuleBuilder::new("CUMEEIRA-SH")
                .basis(DimensionBasis::RidgeLength)
                .consumption(1.0)
                .sort_order(5)
                .build(),
            RuleBuilder::new("PREGO-17")
                .basis(DimensionBasis::RidgeLength)
                .consumption(0.2)
                .sort_order(7)
                .build(),
        ],
    );
    let pipeline = pipeline_with(registry);
    let request = RequestBuilder::new("SH-TEST", 100.0).cumeeira(12.0).build();

    let output = pipeline
        .compute_quantities(&request, &CancellationToken::new())
        .await
        .unwrap();

    // Invariante: nunca dois itens com o mesmo (código, categoria)
    let pregos: Vec<_> = output.items.iter().filter(|i| i.code == "PREGO-17").collect();
    assert_eq!(pregos.len(), 1);
    assert_eq!(pregos[0].sort_order, 3);
    // Derivação vencedora: 100 m² x 0.1 kg/m²
    assert_eq!(pregos[0].net_quantity, 10.0);

    // Descarte estruturado, nunca silencioso
    assert!(output.warnings.iter().any(|w| matches!(
        w,
        ComputationWarning::DuplicateDiscarded {
            code,
            kept_sort_order: 3,
            discarded_sort_order: 7,
            ..
        } if code == "PREGO-17"
    )));
}

// ==========================================
// Validação: acumula todas as violações
// ==========================================
#[tokio::test]
async fn test_validation_lists_every_violated_field() {
    let pipeline = pipeline_with(registry_with_rules(
        "SH-TEST",
        vec![RuleBuilder::new("OSB-11").build()],
    ));
    let request = RequestBuilder::new("DESCONHECIDO", 0.0)
        .cumeeira(-5.0)
        .fator(99.0)
        .build();

    let err = pipeline
        .compute_quantities(&request, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        EngineError::Validation { violations } => {
            let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
            assert!(fields.contains(&"sistema_codigo"));
            assert!(fields.contains(&"area_telhado"));
            assert!(fields.contains(&"comprimento_cumeeira"));
            assert!(fields.contains(&"fator_correcao"));
        }
        other => panic!("esperado Validation, obtido {:?}", other),
    }
}

#[tokio::test]
async fn test_validation_rejects_area_above_bound() {
    let pipeline = pipeline_with(registry_with_rules(
        "SH-TEST",
        vec![RuleBuilder::new("OSB-11").build()],
    ));
    let request = RequestBuilder::new("SH-TEST", 10_001.0).build();

    let err = pipeline
        .compute_quantities(&request, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
}

// ==========================================
// Dimensão zero: regra não gera candidato
// ==========================================
#[tokio::test]
async fn test_zero_ridge_yields_no_ridge_items() {
    let registry = registry_with_rules(
        "SH-TEST",
        vec![
            RuleBuilder::new("OSB-11").consumption(1.0).sort_order(1).build(),
            RuleBuilder::new("CUMEEIRA-SH")
                .basis(DimensionBasis::RidgeLength)
                .consumption(1.0)
                .sort_order(2)
                .build(),
        ],
    );
    let pipeline = pipeline_with(registry);
    // Telhado de uma água: sem cumeeira
    let request = RequestBuilder::new("SH-TEST", 50.0).build();

    let output = pipeline
        .compute_quantities(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert!(output.items.iter().all(|i| i.code != "CUMEEIRA-SH"));
    assert_eq!(output.items.len(), 1);
}

// ==========================================
// Ordenação: (categoria asc, ordem asc)
// ==========================================
#[tokio::test]
async fn test_items_sorted_by_category_then_order() {
    let registry = registry_with_rules(
        "SH-TEST",
        vec![
            RuleBuilder::new("PREGO-17").consumption(0.1).sort_order(9).build(),
            RuleBuilder::new("TELHA-SH").consumption(0.4).sort_order(2).build(),
            RuleBuilder::new("OSB-11").consumption(1.0).sort_order(1).build(),
            RuleBuilder::new("CUMEEIRA-SH")
                .basis(DimensionBasis::RidgeLength)
                .consumption(1.0)
                .sort_order(4)
                .build(),
            RuleBuilder::new("DRIP-BEIRAL")
                .basis(DimensionBasis::EavesPerimeter)
                .consumption(0.5)
                .sort_order(3)
                .build(),
        ],
    );
    let pipeline = pipeline_with(registry);
    let request = RequestBuilder::new("SH-TEST", 80.0)
        .cumeeira(10.0)
        .beiral(30.0)
        .build();

    let output = pipeline
        .compute_quantities(&request, &CancellationToken::new())
        .await
        .unwrap();

    let keys: Vec<(String, i32)> = output
        .items
        .iter()
        .map(|i| (i.category.clone(), i.sort_order))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    // ACABAMENTO vem antes de COBERTURA/ESTRUTURA/FIXACAO; dentro da
    // categoria, a ordem da regra decide
    assert_eq!(output.items[0].code, "DRIP-BEIRAL");
    assert_eq!(output.items[1].code, "CUMEEIRA-SH");
}

// ==========================================
// Determinismo: mesma pergunta, bytes iguais
// ==========================================
#[tokio::test]
async fn test_deterministic_output_for_identical_requests() {
    let registry = registry_with_rules(
        "SH-TEST",
        vec![
            RuleBuilder::new("OSB-11").consumption(1.0).breakage(10.0).sort_order(1).build(),
            RuleBuilder::new("TELHA-SH").consumption(0.4).breakage(8.0).sort_order(2).build(),
            RuleBuilder::new("PREGO-17").consumption(0.12).sort_order(3).build(),
        ],
    );
    let pipeline = pipeline_with(registry);
    let request = RequestBuilder::new("SH-TEST", 123.45).cumeeira(7.5).build();

    let first = pipeline
        .compute_quantities(&request, &CancellationToken::new())
        .await
        .unwrap();
    let second = pipeline
        .compute_quantities(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

// ==========================================
// Propriedade de embalagem (teto)
// ==========================================
#[tokio::test]
async fn test_package_ceiling_property() {
    for (consumption, area, package_size) in [
        (0.37, 83.0, 1.0),
        (1.0, 0.5, 1.0),
        (0.023, 100.0, 1.0),
        (2.0, 33.3, 1.0),
    ] {
        let registry = registry_with_rules(
            "SH-TEST",
            vec![RuleBuilder::new("OSB-11")
                .consumption(consumption)
                .breakage(10.0)
                .sort_order(1)
                .build()],
        );
        let pipeline = pipeline_with(registry);
        let request = RequestBuilder::new("SH-TEST", area).build();

        let output = pipeline
            .compute_quantities(&request, &CancellationToken::new())
            .await
            .unwrap();
        let item = &output.items[0];

        let count = item.package_count as f64;
        assert!(count * package_size >= item.quantity_with_breakage - 1e-9);
        assert!((count - 1.0) * package_size < item.quantity_with_breakage);
    }
}

// ==========================================
// Resultado vazio é sucesso, não erro
// ==========================================
#[tokio::test]
async fn test_empty_result_is_success_with_warning() {
    // Sistema sem regras aplicáveis à área
    let registry = registry_with_rules(
        "SH-TEST",
        vec![RuleBuilder::new("CUMEEIRA-SH")
            .basis(DimensionBasis::RidgeLength)
            .consumption(1.0)
            .sort_order(1)
            .build()],
    );
    let pipeline = pipeline_with(registry);
    let request = RequestBuilder::new("SH-TEST", 50.0).build();

    let output = pipeline
        .compute_quantities(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert!(output.is_empty());
    assert!(output
        .warnings
        .iter()
        .any(|w| matches!(w, ComputationWarning::EmptyResult)));
}

// ==========================================
// Avisos de sanidade do resultado
// ==========================================
#[tokio::test]
async fn test_zero_price_product_emits_warning() {
    let registry = registry_with_rules(
        "SH-TEST",
        vec![RuleBuilder::new("BRINDE-01").consumption(0.01).sort_order(1).build()],
    );
    let pipeline = pipeline_with(registry);
    let request = RequestBuilder::new("SH-TEST", 100.0).build();

    let output = pipeline
        .compute_quantities(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.items[0].line_total, 0.0);
    assert!(output.warnings.iter().any(|w| matches!(
        w,
        ComputationWarning::ZeroPrice { code } if code == "BRINDE-01"
    )));
}

// ==========================================
// Produto ausente do catálogo aborta o cálculo
// ==========================================
#[tokio::test]
async fn test_missing_product_fails_with_catalog_error() {
    let registry = registry_with_rules(
        "SH-TEST",
        vec![RuleBuilder::new("NAO-CADASTRADO").consumption(1.0).sort_order(1).build()],
    );
    let pipeline = pipeline_with(registry);
    let request = RequestBuilder::new("SH-TEST", 100.0).build();

    let err = pipeline
        .compute_quantities(&request, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        EngineError::CatalogLookup { code, .. } => assert_eq!(code, "NAO-CADASTRADO"),
        other => panic!("esperado CatalogLookup, obtido {:?}", other),
    }
}

// ==========================================
// Cancelamento interrompe sem efeito colateral
// ==========================================
#[tokio::test]
async fn test_pre_cancelled_token_stops_computation() {
    let pipeline = pipeline_with(registry_with_rules(
        "SH-TEST",
        vec![RuleBuilder::new("OSB-11").consumption(1.0).sort_order(1).build()],
    ));
    let request = RequestBuilder::new("SH-TEST", 100.0).build();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline
        .compute_quantities(&request, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
}
