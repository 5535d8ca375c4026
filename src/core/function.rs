//! Function values
//!
//! Hanya lambda dan projection yang membawa payload. Primitive, composition
//! dan adverb forms di-erase menjadi marker yang menyimpan tag aslinya.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::Value;
use crate::error::ModelError;

/// Optional `k)` prefix, lalu body dalam kurung kurawal
static LAMBDA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(k\))?\s*\{.*\}$").expect("lambda pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    Lambda(Lambda),
    Projection(Projection),
    /// Primitive, composition atau adverb; hanya tag wire yang tersimpan
    Primitive(i8),
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Lambda(l) => write!(f, "{l}"),
            Function::Projection(p) => write!(f, "{p}"),
            Function::Primitive(tag) => write!(f, "<function {tag}>"),
        }
    }
}

/// Lambda expression, mis. `{x+y}` atau `k){x+y}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lambda {
    expression: String,
}

impl Lambda {
    pub fn new(expression: &str) -> Result<Self, ModelError> {
        let expression = expression.trim();
        if expression.is_empty() || !LAMBDA_PATTERN.is_match(expression) {
            return Err(ModelError::InvalidLambda(expression.to_string()));
        }
        Ok(Self {
            expression: expression.to_string(),
        })
    }

    #[inline]
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Function dengan parameter yang sudah di-apply secara positional.
/// Parameter pertama biasanya function itu sendiri.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    parameters: Vec<Value>,
}

impl Projection {
    pub fn new(parameters: Vec<Value>) -> Self {
        Self { parameters }
    }

    #[inline]
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut params = self.parameters.iter();
        if let Some(head) = params.next() {
            write!(f, "{head}")?;
        }
        f.write_str("[")?;
        for (i, p) in params.enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{p}")?;
        }
        f.write_str("]")
    }
}

impl From<Lambda> for Function {
    fn from(l: Lambda) -> Self {
        Function::Lambda(l)
    }
}

impl From<Projection> for Function {
    fn from(p: Projection) -> Self {
        Function::Projection(p)
    }
}
