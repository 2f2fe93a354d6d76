// ==========================================
// Portal de Propostas - Avaliador de fórmulas
// ==========================================
// Responsabilidade: avaliar expressões aritméticas autoradas pelo
// administrador sobre um conjunto fixo de variáveis
// Regra: somente + - * / ( ), literais numéricos e variáveis {nome};
// nenhuma execução de código do host a partir de texto do usuário
// Regra: variável desconhecida falha fechado (nunca NaN silencioso)
// ==========================================

use crate::domain::types::round2;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::HashMap;

// ==========================================
// Token
// ==========================================
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Variable(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

// ==========================================
// FormulaEvaluator
// ==========================================
pub struct FormulaEvaluator;

impl FormulaEvaluator {
    /// Avalia uma fórmula contra o mapa de variáveis
    ///
    /// # Erros
    /// - sintaxe inválida
    /// - referência a variável indefinida
    /// - resultado não finito (NaN / infinito)
    ///
    /// Resultado arredondado para 2 casas na fronteira.
    pub fn evaluate(formula: &str, variables: &HashMap<String, f64>) -> EngineResult<f64> {
        let trimmed = formula.trim();
        if trimmed.is_empty() {
            return Err(EngineError::formula(formula, "fórmula vazia"));
        }

        let tokens = tokenize(formula)?;
        let mut parser = Parser {
            formula,
            tokens: &tokens,
            pos: 0,
            variables,
        };

        let value = parser.parse_expression()?;
        if parser.pos != parser.tokens.len() {
            return Err(EngineError::formula(
                formula,
                format!("símbolo inesperado na posição {}", parser.pos + 1),
            ));
        }

        if !value.is_finite() {
            return Err(EngineError::formula(formula, "resultado não finito"));
        }

        Ok(round2(value))
    }
}

// ==========================================
// Lexer
// ==========================================
fn tokenize(formula: &str) -> EngineResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = formula.chars().collect();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '{' => {
                // Variável {nome}
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != '}' {
                    end += 1;
                }
                if end >= chars.len() {
                    return Err(EngineError::formula(formula, "'{' sem '}' correspondente"));
                }
                let name: String = chars[start..end].iter().collect();
                if name.trim().is_empty() {
                    return Err(EngineError::formula(formula, "variável sem nome"));
                }
                tokens.push(Token::Variable(name.trim().to_string()));
                i = end + 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                let mut end = i;
                while end < chars.len() && (chars[end].is_ascii_digit() || chars[end] == '.') {
                    end += 1;
                }
                let literal: String = chars[start..end].iter().collect();
                let value = literal.parse::<f64>().map_err(|_| {
                    EngineError::formula(formula, format!("literal numérico inválido: {}", literal))
                })?;
                tokens.push(Token::Number(value));
                i = end;
            }
            other => {
                return Err(EngineError::formula(
                    formula,
                    format!("caractere não permitido: '{}'", other),
                ));
            }
        }
    }

    Ok(tokens)
}

// ==========================================
// Parser (descida recursiva)
// ==========================================
// Gramática:
//   expression := term (('+' | '-') term)*
//   term       := factor (('*' | '/') factor)*
//   factor     := ('+' | '-') factor | primary
//   primary    := número | variável | '(' expression ')'
struct Parser<'a> {
    formula: &'a str,
    tokens: &'a [Token],
    pos: usize,
    variables: &'a HashMap<String, f64>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_expression(&mut self) -> EngineResult<f64> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> EngineResult<f64> {
        let mut value = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.parse_factor()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    value /= self.parse_factor()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_factor(&mut self) -> EngineResult<f64> {
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                self.parse_factor()
            }
            Some(Token::Minus) => {
                self.advance();
                Ok(-self.parse_factor()?)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> EngineResult<f64> {
        match self.advance().cloned() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Variable(name)) => {
                self.variables.get(&name).copied().ok_or_else(|| {
                    EngineError::formula(
                        self.formula,
                        format!("variável indefinida: {{{}}}", name),
                    )
                })
            }
            Some(Token::LParen) => {
                let value = self.parse_expression()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(EngineError::formula(self.formula, "')' esperado")),
                }
            }
            Some(token) => Err(EngineError::formula(
                self.formula,
                format!("símbolo inesperado: {:?}", token),
            )),
            None => Err(EngineError::formula(self.formula, "fim inesperado da fórmula")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pricing_variables() -> HashMap<String, f64> {
        HashMap::from([
            ("preco".to_string(), 45.0),
            ("consumo".to_string(), 1.0),
            ("quebra".to_string(), 10.0),
            ("fator".to_string(), 1.0),
            ("rendimento".to_string(), 3.0),
        ])
    }

    #[test]
    fn test_arithmetic_precedence() {
        let vars = HashMap::new();
        assert_eq!(FormulaEvaluator::evaluate("2 + 3 * 4", &vars).unwrap(), 14.0);
        assert_eq!(FormulaEvaluator::evaluate("(2 + 3) * 4", &vars).unwrap(), 20.0);
        assert_eq!(FormulaEvaluator::evaluate("10 / 4", &vars).unwrap(), 2.5);
        assert_eq!(FormulaEvaluator::evaluate("-2 * -3", &vars).unwrap(), 6.0);
    }

    #[test]
    fn test_variable_substitution() {
        let vars = pricing_variables();
        let value = FormulaEvaluator::evaluate(
            "{preco} / {rendimento} * (1 + {quebra} / 100) * {fator}",
            &vars,
        )
        .unwrap();
        assert_eq!(value, 16.5);
    }

    #[test]
    fn test_undefined_variable_fails_closed() {
        let vars = pricing_variables();
        let err = FormulaEvaluator::evaluate("{preco} * {desconhecida}", &vars).unwrap_err();
        match err {
            EngineError::Formula { formula, message } => {
                assert!(formula.contains("desconhecida"));
                assert!(message.contains("indefinida"));
            }
            other => panic!("esperado Formula, obtido {:?}", other),
        }
    }

    #[test]
    fn test_syntax_errors() {
        let vars = pricing_variables();
        assert!(FormulaEvaluator::evaluate("2 +", &vars).is_err());
        assert!(FormulaEvaluator::evaluate("(2 + 3", &vars).is_err());
        assert!(FormulaEvaluator::evaluate("2 ** 3", &vars).is_err());
        assert!(FormulaEvaluator::evaluate("{preco", &vars).is_err());
        assert!(FormulaEvaluator::evaluate("", &vars).is_err());
        assert!(FormulaEvaluator::evaluate("2; 3", &vars).is_err());
    }

    #[test]
    fn test_non_finite_result_rejected() {
        let vars = HashMap::new();
        let err = FormulaEvaluator::evaluate("1 / 0", &vars).unwrap_err();
        assert!(matches!(err, EngineError::Formula { .. }));
    }

    #[test]
    fn test_result_rounded_at_boundary() {
        let vars = HashMap::new();
        assert_eq!(FormulaEvaluator::evaluate("10 / 3", &vars).unwrap(), 3.33);
    }
}
