//! Input checks that run before any request is made.
//!
//! A failed check returns [`NocturnaError::Validation`] with a message that can
//! be shown to the user as-is.

use chrono::NaiveDate;

use crate::{NocturnaError, Result};

/// Largest party a single reservation may cover.
pub const MAX_PARTY_SIZE: u32 = 50;

/// Reject empty or whitespace-only values.
pub fn require_field(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(NocturnaError::validation(format!(
            "El campo {} es obligatorio",
            name
        )));
    }
    Ok(())
}

/// Accept `HH:MM` in 24 hour format.
pub fn validate_time_hhmm(value: &str) -> Result<()> {
    let invalid = || {
        NocturnaError::validation(format!(
            "Horario inválido: {} (usá el formato HH:MM)",
            value
        ))
    };

    let (hours, minutes) = value.trim().split_once(':').ok_or_else(invalid)?;
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return Err(invalid());
    }
    let hours: u8 = hours.parse().map_err(|_| invalid())?;
    let minutes: u8 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(())
}

/// Accept ISO `YYYY-MM-DD` dates.
pub fn validate_date(value: &str) -> Result<()> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| NocturnaError::validation(format!("Fecha inválida: {}", value)))
}

/// Party size must be between 1 and [`MAX_PARTY_SIZE`].
pub fn validate_party_size(size: u32) -> Result<()> {
    if size == 0 || size > MAX_PARTY_SIZE {
        return Err(NocturnaError::validation(format!(
            "La cantidad de personas debe estar entre 1 y {}",
            MAX_PARTY_SIZE
        )));
    }
    Ok(())
}

/// Ratings go from 1 to 5.
pub fn validate_rating(rating: u8) -> Result<()> {
    if !(1..=5).contains(&rating) {
        return Err(NocturnaError::validation(
            "La puntuación debe estar entre 1 y 5",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_format() {
        assert!(validate_time_hhmm("00:00").is_ok());
        assert!(validate_time_hhmm("23:59").is_ok());
        assert!(validate_time_hhmm("24:00").is_err());
        assert!(validate_time_hhmm("9:30").is_err());
        assert!(validate_time_hhmm("09:3").is_err());
        assert!(validate_time_hhmm("0930").is_err());
        assert!(validate_time_hhmm("ab:cd").is_err());
    }

    #[test]
    fn test_date_format() {
        assert!(validate_date("2026-02-28").is_ok());
        assert!(validate_date("2026-02-30").is_err());
        assert!(validate_date("28/02/2026").is_err());
    }

    #[test]
    fn test_required_field() {
        assert!(require_field("nombre", "Bar Uno").is_ok());
        let err = require_field("nombre", "   ").unwrap_err();
        assert!(err.to_string().contains("nombre"));
    }

    #[test]
    fn test_party_size_and_rating() {
        assert!(validate_party_size(1).is_ok());
        assert!(validate_party_size(0).is_err());
        assert!(validate_party_size(MAX_PARTY_SIZE + 1).is_err());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
    }
}
