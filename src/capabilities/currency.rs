use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{LookupError, decode_success};
use crate::http::HttpClient;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionArgs {
    pub amount: f64,
    pub from_currency: String,
    pub to_currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub from_amount: f64,
    pub from_currency: String,
    pub to_amount: f64,
    pub to_currency: String,
    pub rate: f64,
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: HashMap<String, f64>,
}

pub(super) async fn convert_currency(
    http: &HttpClient,
    base_url: &str,
    args: &ConversionArgs,
) -> Result<Conversion, LookupError> {
    let from_currency = currency_code(&args.from_currency)?;
    let to_currency = currency_code(&args.to_currency)?;

    let url = format!(
        "{}/v4/latest/{from_currency}",
        base_url.trim_end_matches('/')
    );
    let resp = http.get(&url, &[]).await?;
    let latest: LatestRates = decode_success(&resp)?;

    let rate = *latest
        .rates
        .get(&to_currency)
        .ok_or_else(|| LookupError::Data(format!("Currency not found: {to_currency}")))?;

    Ok(Conversion {
        from_amount: args.amount,
        from_currency,
        to_amount: round_cents(args.amount * rate),
        to_currency,
        rate,
    })
}

fn currency_code(raw: &str) -> Result<String, LookupError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() || !code.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(LookupError::Data(format!("invalid currency code '{raw}'")));
    }
    Ok(code)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
