use serde_json::Value;
use validator::ValidateEmail;

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Required,
    NotString,
    NotNumber,
    NotInteger,
    Empty,
    TooShort(usize),
    TooLong(usize),
    NotAlphanumeric,
    InvalidEmail,
    NotAllowed,
}

/// Constraints on a string field, checked in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct TextRule {
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub alphanumeric: bool,
    pub email: bool,
}

impl TextRule {
    pub const fn length(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            alphanumeric: false,
            email: false,
        }
    }
}

pub const EMAIL: TextRule = TextRule {
    min: None,
    max: None,
    alphanumeric: false,
    email: true,
};

pub const PASSWORD: TextRule = TextRule {
    min: Some(8),
    max: Some(20),
    alphanumeric: true,
    email: false,
};

pub const FIRST_NAME_CREATE: TextRule = TextRule::length(3, 50);
pub const FIRST_NAME_UPDATE: TextRule = TextRule::length(2, 50);
pub const LAST_NAME: TextRule = TextRule::length(2, 50);

pub fn check_text(rule: &TextRule, value: Option<&Value>) -> Result<String, Failure> {
    let text = match value {
        None => return Err(Failure::Required),
        Some(Value::String(s)) => s,
        Some(_) => return Err(Failure::NotString),
    };

    if text.is_empty() {
        return Err(Failure::Empty);
    }
    if rule.email && !is_email(text) {
        return Err(Failure::InvalidEmail);
    }

    let len = text.chars().count();
    if let Some(min) = rule.min {
        if len < min {
            return Err(Failure::TooShort(min));
        }
    }
    if let Some(max) = rule.max {
        if len > max {
            return Err(Failure::TooLong(max));
        }
    }
    if rule.alphanumeric && !text.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Failure::NotAlphanumeric);
    }

    Ok(text.clone())
}

/// Numbers and numeric strings are accepted; the result must be integral.
pub fn check_integer(value: Option<&Value>) -> Result<i64, Failure> {
    match value {
        None => Err(Failure::Required),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => Ok(v),
            None => n.as_f64().map_or(Err(Failure::NotNumber), integral),
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<i64>() {
                return Ok(v);
            }
            match s.parse::<f64>() {
                Ok(f) if f.is_finite() => integral(f),
                _ => Err(Failure::NotNumber),
            }
        }
        Some(_) => Err(Failure::NotNumber),
    }
}

fn integral(f: f64) -> Result<i64, Failure> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err(Failure::NotInteger)
    }
}

/// Syntactically valid address whose domain has at least two labels.
fn is_email(text: &str) -> bool {
    let owned = text.to_string();
    if !owned.validate_email() {
        return false;
    }
    match text.rsplit_once('@') {
        Some((_, domain)) => domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2,
        None => false,
    }
}
