use serde::{Deserialize, Serialize};

use super::{LookupError, decode_success};
use crate::http::HttpClient;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovieArgs {
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieInfo {
    pub title: String,
    pub year: String,
    pub rating: String,
    pub plot: String,
    pub director: String,
    pub actors: String,
}

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "Plot")]
    plot: Option<String>,
    #[serde(rename = "Director")]
    director: Option<String>,
    #[serde(rename = "Actors")]
    actors: Option<String>,
}

pub(super) async fn get_movie_info(
    http: &HttpClient,
    base_url: &str,
    api_key: Option<&str>,
    args: &MovieArgs,
) -> Result<MovieInfo, LookupError> {
    let api_key = api_key
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| LookupError::Data("missing OMDB_API_KEY".to_string()))?;

    let mut query = vec![("apikey", api_key), ("t", args.title.as_str())];
    if let Some(year) = args.year.as_deref().filter(|year| !year.trim().is_empty()) {
        query.push(("y", year));
    }

    let url = format!("{}/", base_url.trim_end_matches('/'));
    let resp = http.get(&url, &query).await?;
    let movie: OmdbResponse = decode_success(&resp)?;

    if movie.response != "True" {
        return Err(LookupError::Data("Movie not found".to_string()));
    }

    Ok(MovieInfo {
        title: required(movie.title, "Title")?,
        year: required(movie.year, "Year")?,
        rating: required(movie.imdb_rating, "imdbRating")?,
        plot: required(movie.plot, "Plot")?,
        director: required(movie.director, "Director")?,
        actors: required(movie.actors, "Actors")?,
    })
}

fn required(value: Option<String>, field: &str) -> Result<String, LookupError> {
    value.ok_or_else(|| LookupError::Decode(format!("missing field `{field}`")))
}

#[cfg(test)]
mod tests {
    use super::{MovieArgs, MovieInfo, get_movie_info};
    use crate::capabilities::test_support::{http, registry_for};
    use crate::capabilities::{CapabilityCall, CapabilityInvoker, FunctionResult, LookupError};
    use serde_json::json;
    use std::path::PathBuf;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn inception() -> MovieArgs {
        MovieArgs {
            title: "Inception".to_string(),
            year: None,
        }
    }

    #[tokio::test]
    async fn found_movies_are_mapped_to_the_short_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("apikey", "omdb-key"))
            .and(query_param("t", "Inception"))
            .and(query_param("y", "2010"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Title": "Inception",
                "Year": "2010",
                "Rated": "PG-13",
                "Plot": "A thief who steals corporate secrets...",
                "Director": "Christopher Nolan",
                "Actors": "Leonardo DiCaprio, Joseph Gordon-Levitt",
                "imdbRating": "8.8",
                "Response": "True"
            })))
            .mount(&server)
            .await;

        let info = get_movie_info(
            &http(),
            &server.uri(),
            Some("omdb-key"),
            &MovieArgs {
                year: Some("2010".to_string()),
                ..inception()
            },
        )
        .await
        .expect("movie");

        assert_eq!(
            info,
            MovieInfo {
                title: "Inception".to_string(),
                year: "2010".to_string(),
                rating: "8.8".to_string(),
                plot: "A thief who steals corporate secrets...".to_string(),
                director: "Christopher Nolan".to_string(),
                actors: "Leonardo DiCaprio, Joseph Gordon-Levitt".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn unknown_titles_report_movie_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Response": "False",
                "Error": "Movie not found!"
            })))
            .mount(&server)
            .await;

        let registry = registry_for(&server.uri(), PathBuf::from("unused.csv"));
        let result = registry
            .invoke(CapabilityCall::GetMovieInfo(MovieArgs {
                title: "Zzxqv".to_string(),
                year: None,
            }))
            .await;

        assert_eq!(result, FunctionResult::error("Movie not found"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_a_request() {
        let server = MockServer::start().await;

        let err = get_movie_info(&http(), &server.uri(), None, &inception())
            .await
            .expect_err("no key");

        assert_eq!(err, LookupError::Data("missing OMDB_API_KEY".to_string()));
        let requests = server.received_requests().await.expect("recorded requests");
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn unreachable_service_becomes_an_error_result() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let registry = registry_for(&uri, PathBuf::from("unused.csv"));
        let result = registry
            .invoke(CapabilityCall::GetMovieInfo(inception()))
            .await;

        match result {
            FunctionResult::Error { error } => assert!(error.starts_with("request failed")),
            other => panic!("expected error result, got {other:?}"),
        }
    }
}
