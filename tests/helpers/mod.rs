// ==========================================
// Auxiliares de teste de integração
// ==========================================
// Cada binário de teste usa um subconjunto dos auxiliares
#![allow(dead_code)]

pub mod mock_config;
pub mod test_data_builder;
