use crate::math::{Point3, UVector2, Vector2, Vector3};

use super::units::parse_quantity;

/// Conversion of a raw configuration value into a typed value.
pub trait FromConfigValue: Sized {
    /// Converts the raw text of a configuration value.
    ///
    /// # Errors
    ///
    /// Returns a human readable reason if the text cannot be converted.
    fn from_config_value(text: &str) -> Result<Self, String>;
}

impl FromConfigValue for f64 {
    fn from_config_value(text: &str) -> Result<Self, String> {
        let [element] = fixed_elements::<1>(text)?;
        parse_quantity(&element)
    }
}

impl FromConfigValue for u32 {
    fn from_config_value(text: &str) -> Result<Self, String> {
        let [element] = fixed_elements::<1>(text)?;
        parse_unsigned(&element)
    }
}

impl FromConfigValue for String {
    fn from_config_value(text: &str) -> Result<Self, String> {
        Ok(unquote(text.trim()).to_owned())
    }
}

impl FromConfigValue for Vec<String> {
    fn from_config_value(text: &str) -> Result<Self, String> {
        split_elements(text)
    }
}

impl FromConfigValue for Vector2 {
    fn from_config_value(text: &str) -> Result<Self, String> {
        let [x, y] = fixed_elements::<2>(text)?;
        Ok(Vector2::new(parse_quantity(&x)?, parse_quantity(&y)?))
    }
}

impl FromConfigValue for Vector3 {
    fn from_config_value(text: &str) -> Result<Self, String> {
        let [x, y, z] = fixed_elements::<3>(text)?;
        Ok(Vector3::new(
            parse_quantity(&x)?,
            parse_quantity(&y)?,
            parse_quantity(&z)?,
        ))
    }
}

impl FromConfigValue for Point3 {
    fn from_config_value(text: &str) -> Result<Self, String> {
        Vector3::from_config_value(text).map(Point3::from)
    }
}

impl FromConfigValue for UVector2 {
    fn from_config_value(text: &str) -> Result<Self, String> {
        let [x, y] = fixed_elements::<2>(text)?;
        Ok(UVector2::new(parse_unsigned(&x)?, parse_unsigned(&y)?))
    }
}

fn parse_unsigned(element: &str) -> Result<u32, String> {
    element
        .parse()
        .map_err(|_| format!("'{element}' is not an unsigned integer"))
}

/// Splits a value into exactly `N` elements.
fn fixed_elements<const N: usize>(text: &str) -> Result<[String; N], String> {
    let elements = split_elements(text)?;
    let count = elements.len();
    elements
        .try_into()
        .map_err(|_| format!("expected {N} element(s) but found {count}"))
}

/// Splits a value on whitespace and commas, keeping quoted strings intact.
fn split_elements(text: &str) -> Result<Vec<String>, String> {
    let mut elements = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in text.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if !in_quotes && (c.is_whitespace() || c == ',') => {
                if !current.is_empty() {
                    elements.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quote".to_owned());
    }
    if !current.is_empty() {
        elements.push(current);
    }
    Ok(elements)
}

/// Strips one pair of surrounding double quotes.
pub(crate) fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}
