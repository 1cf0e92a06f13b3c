use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::LookupError;
use crate::http::HttpClient;

pub const DEFAULT_JOKE_CATEGORY: &str = "Programming";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JokeArgs {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Joke {
    Single {
        joke: String,
        category: String,
    },
    TwoPart {
        setup: String,
        delivery: String,
        category: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum JokeApiJoke {
    Single {
        joke: String,
        category: String,
    },
    TwoPart {
        setup: String,
        delivery: String,
        category: String,
    },
}

pub(super) async fn get_joke(
    http: &HttpClient,
    base_url: &str,
    args: &JokeArgs,
) -> Result<Joke, LookupError> {
    let category = args
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .unwrap_or(DEFAULT_JOKE_CATEGORY);

    let url = joke_url(base_url, category)?;
    let resp = http.get(url.as_str(), &[]).await?;

    // JokeAPI reports failures as `{"error": true, "message": ...}`, often
    // with a 4xx status.
    let body = serde_json::from_str::<Value>(&resp.body).ok();
    if let Some(message) = body.as_ref().and_then(api_error_message) {
        return Err(LookupError::Data(message));
    }
    if !resp.is_success() {
        return Err(LookupError::HttpStatus {
            status: resp.status,
        });
    }

    let body = body.ok_or_else(|| LookupError::Decode("response is not JSON".to_string()))?;
    let joke = serde_json::from_value::<JokeApiJoke>(body)
        .map_err(|err| LookupError::Decode(err.to_string()))?;

    Ok(match joke {
        JokeApiJoke::Single { joke, category } => Joke::Single { joke, category },
        JokeApiJoke::TwoPart {
            setup,
            delivery,
            category,
        } => Joke::TwoPart {
            setup,
            delivery,
            category,
        },
    })
}

fn joke_url(base_url: &str, category: &str) -> Result<Url, LookupError> {
    let mut url = Url::parse(base_url)
        .map_err(|err| LookupError::Transport(format!("invalid joke endpoint {base_url}: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| LookupError::Transport(format!("invalid joke endpoint {base_url}")))?
        .pop_if_empty()
        .push("joke")
        .push(category);
    url.set_query(Some("safe-mode"));
    Ok(url)
}

fn api_error_message(body: &Value) -> Option<String> {
    if body.get("error").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("joke service reported an error");
    Some(message.to_string())
}
