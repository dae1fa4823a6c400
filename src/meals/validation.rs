use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

pub const NAME_MAX_CHARS: usize = 100;

/// Which form field a name belongs to; only changes the messages.
#[derive(Debug, Clone, Copy)]
pub enum NameField {
    Meal,
    Ingredient,
}

/// Trims and checks a meal or ingredient name.
pub fn validate_name(raw: &str, field: NameField) -> Result<String, String> {
    let name = raw.trim();
    let (required, length, printable) = match field {
        NameField::Meal => (
            "The meal name is required.",
            "Meal name must be between 1 and 100 characters.",
            "Meal name must not contain control characters.",
        ),
        NameField::Ingredient => (
            "The ingredient name is required.",
            "Ingredient name must be between 1 and 100 characters.",
            "Ingredient name must not contain control characters.",
        ),
    };

    if name.is_empty() {
        return Err(required.into());
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(length.into());
    }
    // text columns cannot hold NUL
    if name.chars().any(char::is_control) {
        return Err(printable.into());
    }
    Ok(name.to_string())
}

/// Parses a currency amount such as `12`, `3.5`, `$0.99` into a cost within
/// `0.01..=999.99`.
pub fn parse_cost(raw: &str) -> Result<Decimal, String> {
    lazy_static! {
        static ref CURRENCY_RE: Regex = Regex::new(r"^\$?\d+(\.\d{1,2})?$").unwrap();
    }

    let raw = raw.trim();
    if raw.is_empty() {
        return Err("The ingredient cost is required.".into());
    }
    if !CURRENCY_RE.is_match(raw) {
        return Err("Ingredient cost must be positive number with two digit decimal".into());
    }

    let cost: Decimal = raw
        .trim_start_matches('$')
        .parse()
        .map_err(|_| "Ingredient cost must be positive number with two digit decimal".to_string())?;
    if cost < Decimal::new(1, 2) || cost > Decimal::new(99999, 2) {
        return Err("The cost should be between $0.01 - $999.99".into());
    }
    Ok(cost)
}
