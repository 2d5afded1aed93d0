//! Copernicus Data Space Ecosystem (CDSE) client: OpenID token, OData catalogue
//! search and product download.
//!
//! See <https://documentation.dataspace.copernicus.eu/APIs/OData.html>.
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

pub const TOKEN_URL: &str =
    "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token";
pub const CATALOGUE_URL: &str = "https://catalogue.dataspace.copernicus.eu/odata/v1/Products";
pub const DOWNLOAD_URL: &str = "https://zipper.dataspace.copernicus.eu/odata/v1/Products";
const CLIENT_ID: &str = "cdse-public";

/// Errors encountered when talking to CDSE
#[derive(Debug, Error)]
pub enum CdseError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{url} answered {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Invalid date `{0}`, expected YYYYMMDD")]
    InvalidDate(String),
    #[error("Downloaded {actual} bytes, expected {expected}")]
    SizeMismatch { expected: u64, actual: u64 },
}

/// Service endpoints, overridable for mirrors
#[derive(Debug, Clone)]
pub struct CdseEndpoints {
    pub token: String,
    pub catalogue: String,
    pub download: String,
}

impl Default for CdseEndpoints {
    fn default() -> Self {
        Self {
            token: TOKEN_URL.to_string(),
            catalogue: CATALOGUE_URL.to_string(),
            download: DOWNLOAD_URL.to_string(),
        }
    }
}

/// HTTP timeouts of a CDSE session
#[derive(Debug, Clone, PartialEq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    /// Whole-request limit; `None` lets full product downloads run as long as data flows
    pub request: Option<Duration>,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            request: None,
        }
    }
}

impl HttpTimeouts {
    fn client(&self) -> Result<reqwest::blocking::Client, CdseError> {
        // The blocking client otherwise applies a 30 s total timeout of its own
        Ok(reqwest::blocking::Client::builder()
            .connect_timeout(self.connect)
            .timeout(self.request)
            .build()?)
    }
}

/// A catalogue entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    pub id: String,
    /// Product name, usually ending in `.SAFE`
    pub name: String,
    #[serde(default)]
    pub content_length: Option<u64>,
    #[serde(default = "default_online")]
    pub online: bool,
}

fn default_online() -> bool {
    true
}

impl Product {
    /// File name the archive is stored under
    pub fn archive_name(&self) -> String {
        let base = self.name.strip_suffix(".SAFE").unwrap_or(&self.name);
        format!("{}.zip", base)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogueResponse {
    value: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error_description: Option<String>,
}

/// Catalogue search parameters for one tile
#[derive(Debug, Clone)]
pub struct ProductQuery {
    /// e.g. `MSIL2A`
    pub product_type: String,
    /// Tile id without the leading `T`, e.g. `33TVG`
    pub tile: String,
    /// First sensing day, `YYYYMMDD`
    pub from: String,
    /// Last sensing day (inclusive), `YYYYMMDD`
    pub to: String,
}

impl ProductQuery {
    /// OData `$filter` expression for this query
    pub fn filter(&self) -> Result<String, CdseError> {
        let from = parse_day(&self.from)?;
        let to = parse_day(&self.to)?;
        let end = to.succ_opt().unwrap_or(to);
        Ok(format!(
            "Collection/Name eq 'SENTINEL-2' and contains(Name,'{}') and contains(Name,'_T{}_') \
             and ContentDate/Start ge {}T00:00:00.000Z and ContentDate/Start lt {}T00:00:00.000Z",
            self.product_type,
            self.tile,
            from.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        ))
    }
}

fn parse_day(s: &str) -> Result<NaiveDate, CdseError> {
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| CdseError::InvalidDate(s.to_string()))
}

/// Authenticated CDSE session
pub struct CdseClient {
    http: reqwest::blocking::Client,
    endpoints: CdseEndpoints,
    access_token: String,
}

impl CdseClient {
    /// Obtain an access token with the password grant of the public client
    pub fn authenticate(username: &str, password: &str) -> Result<Self, CdseError> {
        Self::authenticate_with(
            CdseEndpoints::default(),
            &HttpTimeouts::default(),
            username,
            password,
        )
    }

    pub fn authenticate_with(
        endpoints: CdseEndpoints,
        timeouts: &HttpTimeouts,
        username: &str,
        password: &str,
    ) -> Result<Self, CdseError> {
        let http = timeouts.client()?;

        let response = http
            .post(&endpoints.token)
            .form(&[
                ("client_id", CLIENT_ID),
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
            ])
            .send()?;

        let status = response.status();
        let token: TokenResponse = response.json()?;
        let access_token = match (status.is_success(), token.access_token) {
            (true, Some(t)) => t,
            (_, _) => {
                return Err(CdseError::Auth(
                    token
                        .error_description
                        .unwrap_or_else(|| format!("token endpoint answered {}", status)),
                ));
            }
        };

        info!("Access granted using CDSE token");
        Ok(Self {
            http,
            endpoints,
            access_token,
        })
    }

    /// Search the catalogue for products matching `query`
    pub fn search(&self, query: &ProductQuery) -> Result<Vec<Product>, CdseError> {
        let filter = query.filter()?;
        debug!("OData filter: {}", filter);
        let response = self
            .http
            .get(&self.endpoints.catalogue)
            .query(&[
                ("$filter", filter.as_str()),
                ("$orderby", "ContentDate/Start asc"),
                ("$top", "1000"),
            ])
            .send()?;
        let response = check_status(response)?;
        let catalogue: CatalogueResponse = response.json()?;
        Ok(catalogue.value)
    }

    /// Stream product `id` into `target`, returning the number of bytes written.
    ///
    /// The archive is written to a temporary file next to `target` and only
    /// renamed into place once complete.
    pub fn download(&self, id: &str, target: &Path) -> Result<u64, CdseError> {
        let url = format!("{}({})/$value", self.endpoints.download, id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()?;
        let mut response = check_status(response)?;

        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".partial_")
            .suffix(".zip")
            .tempfile_in(&dir)?;
        let written = response.copy_to(tmp.as_file_mut())?;
        tmp.persist(target).map_err(|e| CdseError::Io(e.error))?;
        Ok(written)
    }
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, CdseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().unwrap_or_default();
    Err(CdseError::Status {
        url,
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_covers_inclusive_day_range() {
        let query = ProductQuery {
            product_type: "MSIL2A".to_string(),
            tile: "33TVG".to_string(),
            from: "20220701".to_string(),
            to: "20220710".to_string(),
        };
        let filter = query.filter().unwrap();
        assert!(filter.contains("contains(Name,'_T33TVG_')"));
        assert!(filter.contains("contains(Name,'MSIL2A')"));
        assert!(filter.contains("ge 2022-07-01T00:00:00.000Z"));
        assert!(filter.contains("lt 2022-07-11T00:00:00.000Z"));
    }

    #[test]
    fn downloads_have_no_total_timeout() {
        let timeouts = HttpTimeouts::default();
        assert_eq!(timeouts.request, None);
        assert_eq!(timeouts.connect, Duration::from_secs(30));
        assert!(timeouts.client().is_ok());
    }

    #[test]
    fn bad_dates_are_rejected() {
        let query = ProductQuery {
            product_type: "MSIL2A".to_string(),
            tile: "33TVG".to_string(),
            from: "2022-07-01".to_string(),
            to: "20220710".to_string(),
        };
        assert!(matches!(query.filter(), Err(CdseError::InvalidDate(_))));
    }

    #[test]
    fn catalogue_entries_deserialize() {
        let json = r#"{"value":[{"Id":"d4faeb89-2588-5423-806b-750e32b58257",
            "Name":"S2A_MSIL2A_20220701T095041_N0400_R079_T33TVG_20220701T141709.SAFE",
            "ContentLength":1172061405,"Online":true,"Footprint":"ignored"}]}"#;
        let response: CatalogueResponse = serde_json::from_str(json).unwrap();
        let product = &response.value[0];
        assert_eq!(product.content_length, Some(1172061405));
        assert_eq!(
            product.archive_name(),
            "S2A_MSIL2A_20220701T095041_N0400_R079_T33TVG_20220701T141709.zip"
        );
    }
}
