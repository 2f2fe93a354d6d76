// ==========================================
// Módulo de internacionalização (i18n)
// ==========================================
// Usa a biblioteca rust-i18n
// Suporta português brasileiro (padrão) e inglês
// ==========================================
// Atenção: a macro rust_i18n::i18n! é inicializada em lib.rs
// ==========================================

/// Retorna o idioma corrente
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// Define o idioma corrente
///
/// # Parâmetros
/// - locale: código do idioma ("pt-BR" ou "en")
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// Traduz uma mensagem (sem parâmetros)
///
/// # Exemplo
/// ```no_run
/// use orcamento_engine::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// Traduz uma mensagem (com parâmetros)
///
/// # Exemplo
/// ```no_run
/// use orcamento_engine::i18n::t_with_args;
/// let msg = t_with_args("quote.items_priced", &[("count", "12")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
