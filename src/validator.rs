//! Request parsing and validation.
//!
//! Turns a raw request payload into [`Criteria`], or into the
//! [`ValidationError`] whose text is sent back to the client.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::error::ValidationError;

/// Catalog gender after synonym collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Girl,
    Boy,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Girl => "girl",
            Gender::Boy => "boy",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized search criteria. `letter` is always in `'a'..='z'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Criteria {
    pub gender: Gender,
    pub letter: char,
}

/// A decoded request. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub gender: Option<Value>,
    #[serde(default)]
    pub letter: Option<Value>,
}

impl Request {
    /// Decode a request payload. Anything other than a JSON object is rejected.
    pub fn from_payload(payload: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| ValidationError::MalformedRequest(e.to_string()))?;
        if !value.is_object() {
            return Err(ValidationError::MalformedRequest(format!(
                "expected an object, found {}",
                json_kind(&value)
            )));
        }
        serde_json::from_value(value).map_err(|e| ValidationError::MalformedRequest(e.to_string()))
    }

    /// Check both keys are present, gender first, then validate their values.
    pub fn criteria(&self) -> Result<Criteria, ValidationError> {
        let gender = self
            .gender
            .as_ref()
            .ok_or(ValidationError::MissingKey("gender"))?;
        let letter = self
            .letter
            .as_ref()
            .ok_or(ValidationError::MissingKey("letter"))?;

        let gender = gender.as_str().ok_or(ValidationError::InvalidGender)?;
        let Some(letter) = letter.as_str() else {
            // A non-string letter still loses to an invalid gender.
            parse_gender(gender)?;
            return Err(ValidationError::InvalidLetter);
        };

        validate(gender, letter)
    }
}

/// Case-fold and check the gender and letter, gender first.
pub fn validate(gender: &str, letter: &str) -> Result<Criteria, ValidationError> {
    let gender = parse_gender(gender)?;
    let letter = parse_letter(letter)?;
    Ok(Criteria { gender, letter })
}

fn parse_gender(gender: &str) -> Result<Gender, ValidationError> {
    match gender.to_lowercase().as_str() {
        "girl" | "female" | "f" => Ok(Gender::Girl),
        "boy" | "male" | "m" => Ok(Gender::Boy),
        _ => Err(ValidationError::InvalidGender),
    }
}

fn parse_letter(letter: &str) -> Result<char, ValidationError> {
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_lowercase()),
        _ => Err(ValidationError::InvalidLetter),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
