mod currency;
mod joke;
mod movie;
mod sales;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::http::{HttpClient, HttpResponseData};
use crate::llm::provider::{FunctionCall, FunctionDeclaration};

pub use currency::{Conversion, ConversionArgs};
pub use joke::{DEFAULT_JOKE_CATEGORY, Joke, JokeArgs};
pub use movie::{MovieArgs, MovieInfo};
pub use sales::{SalesQuery, SalesSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ConvertCurrency,
    GetJoke,
    GetMovieInfo,
    GetSalesData,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Self::ConvertCurrency,
        Self::GetJoke,
        Self::GetMovieInfo,
        Self::GetSalesData,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|capability| capability.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ConvertCurrency => "convert_currency",
            Self::GetJoke => "get_joke",
            Self::GetMovieInfo => "get_movie_info",
            Self::GetSalesData => "get_sales_data",
        }
    }

    pub fn declaration(self) -> FunctionDeclaration {
        let (description, parameters) = match self {
            Self::ConvertCurrency => (
                "Convert an amount from one currency to another using current exchange rates",
                json!({
                    "type": "object",
                    "properties": {
                        "amount": {
                            "type": "number",
                            "description": "The amount of money to convert"
                        },
                        "from_currency": {
                            "type": "string",
                            "description": "The currency code to convert from (e.g., USD, EUR, GBP)"
                        },
                        "to_currency": {
                            "type": "string",
                            "description": "The currency code to convert to (e.g., USD, EUR, GBP)"
                        }
                    },
                    "required": ["amount", "from_currency", "to_currency"]
                }),
            ),
            Self::GetJoke => (
                "Get a random joke",
                json!({
                    "type": "object",
                    "properties": {
                        "category": {
                            "type": "string",
                            "description": "Joke category: Programming, Misc, Pun, Spooky or Christmas (optional)"
                        }
                    },
                    "required": []
                }),
            ),
            Self::GetMovieInfo => (
                "Get information about a movie by its title",
                json!({
                    "type": "object",
                    "properties": {
                        "title": {
                            "type": "string",
                            "description": "The title of the movie"
                        },
                        "year": {
                            "type": "string",
                            "description": "Release year to disambiguate remakes (optional)"
                        }
                    },
                    "required": ["title"]
                }),
            ),
            Self::GetSalesData => (
                "Get sales data from the store's database with optional date and product category filters",
                json!({
                    "type": "object",
                    "properties": {
                        "date": {
                            "type": "string",
                            "description": "Date in YYYY-MM-DD format (optional)"
                        },
                        "product_category": {
                            "type": "string",
                            "description": "Product category to filter by (optional)"
                        }
                    },
                    "required": []
                }),
            ),
        };

        FunctionDeclaration {
            name: self.name().to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityCall {
    ConvertCurrency(ConversionArgs),
    GetJoke(JokeArgs),
    GetMovieInfo(MovieArgs),
    GetSalesData(SalesQuery),
}

impl CapabilityCall {
    pub fn from_function_call(call: &FunctionCall) -> Result<Self, RegistryError> {
        let capability = Capability::from_name(&call.name)
            .ok_or_else(|| RegistryError::CapabilityNotFound(call.name.clone()))?;
        Self::decode(capability, &call.arguments)
    }

    pub fn decode(capability: Capability, arguments: &str) -> Result<Self, RegistryError> {
        let fields = parse_argument_object(capability, arguments)?;
        Ok(match capability {
            Capability::ConvertCurrency => Self::ConvertCurrency(decode_args(capability, fields)?),
            Capability::GetJoke => Self::GetJoke(decode_args(capability, fields)?),
            Capability::GetMovieInfo => Self::GetMovieInfo(decode_args(capability, fields)?),
            Capability::GetSalesData => Self::GetSalesData(decode_args(capability, fields)?),
        })
    }
}

fn parse_argument_object(
    capability: Capability,
    arguments: &str,
) -> Result<Map<String, Value>, RegistryError> {
    let value = serde_json::from_str::<Value>(arguments)
        .map_err(|err| argument_error(capability, err.to_string()))?;
    match value {
        Value::Object(fields) => Ok(fields),
        other => Err(argument_error(
            capability,
            format!("expected a JSON object, got {other}"),
        )),
    }
}

fn decode_args<T: DeserializeOwned>(
    capability: Capability,
    fields: Map<String, Value>,
) -> Result<T, RegistryError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|err| argument_error(capability, err.to_string()))
}

fn argument_error(capability: Capability, reason: String) -> RegistryError {
    RegistryError::ArgumentParse {
        name: capability.name().to_string(),
        reason,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    CapabilityNotFound(String),
    ArgumentParse { name: String, reason: String },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CapabilityNotFound(name) => write!(f, "unknown function: {name}"),
            Self::ArgumentParse { name, reason } => {
                write!(f, "invalid arguments for {name}: {reason}")
            }
        }
    }
}

impl Error for RegistryError {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FunctionResult {
    Error { error: String },
    Value(Value),
}

impl FunctionResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn from_lookup<T: Serialize>(result: Result<T, LookupError>) -> Self {
        match result {
            Ok(output) => match serde_json::to_value(output) {
                Ok(value) => Self::Value(value),
                Err(err) => Self::error(format!("failed to encode result: {err}")),
            },
            Err(err) => Self::error(err.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn to_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            json!({ "error": format!("failed to encode result: {err}") }).to_string()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    Transport(String),
    HttpStatus { status: u16 },
    Decode(String),
    Data(String),
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "request failed: {msg}"),
            Self::HttpStatus { status } => write!(f, "upstream returned status {status}"),
            Self::Decode(msg) => write!(f, "unexpected upstream response: {msg}"),
            Self::Data(msg) => write!(f, "{msg}"),
        }
    }
}

impl Error for LookupError {}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

fn decode_success<T: DeserializeOwned>(resp: &HttpResponseData) -> Result<T, LookupError> {
    if !resp.is_success() {
        return Err(LookupError::HttpStatus {
            status: resp.status,
        });
    }
    serde_json::from_str(&resp.body).map_err(|err| LookupError::Decode(err.to_string()))
}

pub trait CapabilityInvoker {
    fn describe(&self) -> Vec<FunctionDeclaration> {
        Capability::ALL
            .into_iter()
            .map(Capability::declaration)
            .collect()
    }

    fn resolve(&self, call: &FunctionCall) -> Result<CapabilityCall, RegistryError> {
        CapabilityCall::from_function_call(call)
    }

    fn invoke(
        &self,
        call: CapabilityCall,
    ) -> impl std::future::Future<Output = FunctionResult> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupEndpoints {
    pub joke_base_url: String,
    pub omdb_base_url: String,
    pub omdb_api_key: Option<String>,
    pub exchange_rate_base_url: String,
    pub sales_data_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Registry {
    http: HttpClient,
    endpoints: LookupEndpoints,
}

impl Registry {
    pub fn new(http: HttpClient, endpoints: LookupEndpoints) -> Self {
        Self { http, endpoints }
    }
}

impl CapabilityInvoker for Registry {
    async fn invoke(&self, call: CapabilityCall) -> FunctionResult {
        let endpoints = &self.endpoints;
        match call {
            CapabilityCall::ConvertCurrency(args) => FunctionResult::from_lookup(
                currency::convert_currency(&self.http, &endpoints.exchange_rate_base_url, &args)
                    .await,
            ),
            CapabilityCall::GetJoke(args) => FunctionResult::from_lookup(
                joke::get_joke(&self.http, &endpoints.joke_base_url, &args).await,
            ),
            CapabilityCall::GetMovieInfo(args) => FunctionResult::from_lookup(
                movie::get_movie_info(
                    &self.http,
                    &endpoints.omdb_base_url,
                    endpoints.omdb_api_key.as_deref(),
                    &args,
                )
                .await,
            ),
            CapabilityCall::GetSalesData(query) => FunctionResult::from_lookup(
                sales::get_sales_data(&endpoints.sales_data_path, &query).await,
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use reqwest::Client;

    use super::{
        CapabilityCall, CapabilityInvoker, FunctionResult, LookupEndpoints, Registry,
        RegistryError,
    };
    use crate::http::{HttpClient, HttpDebugConfig};
    use crate::llm::provider::FunctionCall;

    impl Registry {
        pub async fn invoke_named(
            &self,
            name: &str,
            arguments: &str,
        ) -> Result<FunctionResult, RegistryError> {
            let call = CapabilityCall::from_function_call(&FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            })?;
            Ok(self.invoke(call).await)
        }
    }

    pub fn http() -> HttpClient {
        HttpClient::new(Client::new(), HttpDebugConfig::disabled())
    }

    pub fn registry_for(base_url: &str, sales_data_path: PathBuf) -> Registry {
        Registry::new(
            http(),
            LookupEndpoints {
                joke_base_url: base_url.to_string(),
                omdb_base_url: base_url.to_string(),
                omdb_api_key: Some("omdb-key".to_string()),
                exchange_rate_base_url: base_url.to_string(),
                sales_data_path,
            },
        )
    }
}
