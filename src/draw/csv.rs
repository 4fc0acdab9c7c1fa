//! CSV prize import
//!
//! Format: a header row (always skipped, content ignored) followed by one
//! `name,value[,...]` record per line. Commas inside double quotes are part
//! of the field. This is a quote-toggle scanner, not RFC 4180: a doubled
//! quote (`""`) does not produce a literal quote character, and quote
//! characters never appear in the output.

use thiserror::Error;

use super::prize::Prize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no valid prizes found; expected a header row then `name,value` rows")]
    NoValidRecords,
}

/// Split one record on commas outside double quotes.
pub fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parse an uploaded prize table.
pub fn parse(text: &str) -> Result<Vec<Prize>, ParseError> {
    let prizes: Vec<Prize> = text
        .trim()
        .split('\n')
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let fields = split_record(line);
            match fields.as_slice() {
                [name, value, ..] => Some(Prize::new(name.trim(), value.trim())),
                _ => {
                    log::debug!("Skipping CSV row without a value column: {:?}", line);
                    None
                }
            }
        })
        .collect();

    if prizes.is_empty() {
        return Err(ParseError::NoValidRecords);
    }
    Ok(prizes)
}
