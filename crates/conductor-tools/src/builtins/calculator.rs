//! Calculator tool - arithmetic expression evaluation
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/' | '%') unary)*
//! unary  := ('-' | '+') unary | power
//! power  := atom ('^' unary)?
//! atom   := number | '(' expr ')'
//! ```

use crate::error::{Error, Result};
use crate::registry::{Tool, ToolCategory, ToolDefinition, ToolResult};
use std::iter::Peekable;
use std::str::Chars;
use std::time::Instant;
use tracing::debug;

/// Deepest nesting of parentheses, signs and exponents accepted
pub const MAX_DEPTH: usize = 128;

/// Evaluate an arithmetic expression
///
/// # Errors
/// Returns [`Error::InvalidInput`] for malformed expressions or nesting
/// beyond [`MAX_DEPTH`], and [`Error::Execution`] for division by zero or
/// non-finite results
pub fn evaluate(expression: &str) -> Result<f64> {
    let mut parser = Parser {
        chars: expression.chars().peekable(),
        depth: 0,
    };
    let value = parser.expr()?;
    parser.skip_whitespace();
    if let Some(c) = parser.chars.peek() {
        return Err(Error::InvalidInput(format!(
            "Unexpected character '{}' in expression",
            c
        )));
    }
    if !value.is_finite() {
        return Err(Error::Execution("Result is not a finite number".to_string()));
    }
    Ok(value)
}

/// Render a number without a fractional part when it is integral
///
/// ```
/// use conductor_tools::builtins::format_number;
///
/// assert_eq!(format_number(4.0), "4");
/// assert_eq!(format_number(2.5), "2.5");
/// ```
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::InvalidInput("Expression nested too deeply".to_string()));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.chars.peek() == Some(&expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        loop {
            if self.eat('*') {
                value *= self.unary()?;
            } else if self.eat('/') {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err(Error::Execution("Division by zero".to_string()));
                }
                value /= divisor;
            } else if self.eat('%') {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err(Error::Execution("Modulo by zero".to_string()));
                }
                value %= divisor;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<f64> {
        if self.eat('-') {
            return Ok(-self.nested(Self::unary)?);
        }
        if self.eat('+') {
            return self.nested(Self::unary);
        }
        self.power()
    }

    fn power(&mut self) -> Result<f64> {
        let base = self.atom()?;
        if self.eat('^') {
            let exponent = self.nested(Self::unary)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64> {
        if self.eat('(') {
            let value = self.nested(Self::expr)?;
            if !self.eat(')') {
                return Err(Error::InvalidInput("Missing closing parenthesis".to_string()));
            }
            return Ok(value);
        }
        self.number()
    }

    fn number(&mut self) -> Result<f64> {
        self.skip_whitespace();
        let mut literal = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                literal.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if literal.is_empty() {
            return Err(match self.chars.peek() {
                Some(c) => Error::InvalidInput(format!("Unexpected character '{}' in expression", c)),
                None => Error::InvalidInput("Unexpected end of expression".to_string()),
            });
        }
        literal
            .parse()
            .map_err(|_| Error::InvalidInput(format!("Invalid number '{}'", literal)))
    }
}

/// Arithmetic calculator tool
pub struct CalculatorTool {
    definition: ToolDefinition,
}

impl CalculatorTool {
    /// Create a new calculator tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "calculator",
            "Evaluate an arithmetic expression with + - * / % ^ and parentheses.",
        )
        .with_category(ToolCategory::Arithmetic)
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Expression to evaluate, e.g. '(2 + 3) * 4'"
                }
            },
            "required": ["expression"]
        }));

        Self { definition }
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for CalculatorTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let expression = input
            .get("expression")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'expression' parameter".to_string()))?;

        let value = evaluate(expression)?;
        debug!(expression = %expression, value = %value, "Evaluated expression");

        Ok(ToolResult::success(
            serde_json::json!({
                "expression": expression,
                "value": value,
                "result": format_number(value),
            }),
            start.elapsed().as_millis() as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("2 + 2").unwrap(), 4.0);
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("10 % 4").unwrap(), 2.0);
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
    }

    #[test]
    fn test_unary_and_decimals() {
        assert_eq!(evaluate("-3 + 5").unwrap(), 2.0);
        assert_eq!(evaluate("-(2 * 3)").unwrap(), -6.0);
        assert_eq!(evaluate("1.5 * 2").unwrap(), 3.0);
        assert_eq!(evaluate("2 ^ -1").unwrap(), 0.5);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(evaluate("1 / 0"), Err(Error::Execution(_))));
        assert!(matches!(evaluate("2 +"), Err(Error::InvalidInput(_))));
        assert!(matches!(evaluate("(1 + 2"), Err(Error::InvalidInput(_))));
        assert!(matches!(evaluate("2 apples"), Err(Error::InvalidInput(_))));
        assert!(matches!(evaluate(""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_nesting_limit() {
        let shallow = format!("{}1{}", "(".repeat(MAX_DEPTH - 1), ")".repeat(MAX_DEPTH - 1));
        assert_eq!(evaluate(&shallow).unwrap(), 1.0);

        let deep = format!("{}1{}", "(".repeat(5_000), ")".repeat(5_000));
        assert!(matches!(evaluate(&deep), Err(Error::InvalidInput(msg)) if msg.contains("too deeply")));

        let signs = format!("{}1", "-".repeat(100_000));
        assert!(matches!(evaluate(&signs), Err(Error::InvalidInput(_))));

        let exponents = format!("2{}", " ^ 1".repeat(5_000));
        assert!(matches!(evaluate(&exponents), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(0.25), "0.25");
    }

    #[tokio::test]
    async fn test_tool_output() {
        let result = CalculatorTool::new()
            .execute(serde_json::json!({"expression": "2 + 2"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.result_text().as_deref(), Some("4"));
        assert_eq!(result.output["expression"], "2 + 2");
    }
}
