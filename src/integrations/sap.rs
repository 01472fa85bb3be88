//! SAP Business One service layer gateway.
//!
//! Each call logs in with the company's credentials, uses the returned
//! session as the `B1SESSION` cookie, and logs out again. Sessions are not
//! cached between calls.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{endpoint, ensure_success, IntegrationError};
use crate::config::IntegrationsConfig;
use crate::error::ApiError;
use crate::validation::FieldErrors;

const SERVICE: &str = "SAP";

#[derive(Clone, Deserialize)]
pub struct SapCompany {
    pub base_url: String,
    pub company_db: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SapCompany {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SapCompany")
            .field("base_url", &self.base_url)
            .field("company_db", &self.company_db)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Contents of the SAP companies YAML file, keyed by company code
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SapCompanies {
    #[serde(default)]
    pub companies: BTreeMap<String, SapCompany>,
}

impl SapCompanies {
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, IntegrationError> {
        let path = path.as_ref();
        let config_error = |message: String| IntegrationError::Config {
            path: path.display().to_string(),
            message,
        };
        let source = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        Self::from_yaml_str(&source).map_err(|e| config_error(e.to_string()))
    }

    /// Missing file means no SAP companies, not a startup failure
    pub fn load_or_empty(path: Option<&str>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(companies) => {
                tracing::info!("Loaded {} SAP company profile(s) from {}", companies.companies.len(), path);
                companies
            }
            Err(e) => {
                tracing::warn!("SAP integration disabled: {}", e);
                Self::default()
            }
        }
    }

    pub fn get(&self, company: &str) -> Result<&SapCompany, IntegrationError> {
        self.companies
            .get(company)
            .ok_or_else(|| IntegrationError::UnknownCompany(company.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        self.companies.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRequestLine {
    pub item_code: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub required_date: Option<NaiveDate>,
    pub cost_center: Option<String>,
    pub project: Option<String>,
}

/// Purchase request as posted by portal clients
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRequestInput {
    pub company: Option<String>,
    pub required_date: Option<NaiveDate>,
    pub requester_email: Option<String>,
    pub comments: Option<String>,
    #[serde(default)]
    pub lines: Vec<PurchaseRequestLine>,
}

impl PurchaseRequestInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.require_text("company", self.company.as_deref());
        if self.required_date.is_none() {
            errors.add("required_date", "Campo requerido");
        }
        if self.lines.is_empty() {
            errors.add("lines", "Debe incluir al menos una línea");
        }
        for (index, line) in self.lines.iter().enumerate() {
            errors.require_text(&format!("lines[{}].item_code", index), line.item_code.as_deref());
            if !matches!(line.quantity, Some(q) if q > Decimal::ZERO) {
                errors.add(&format!("lines[{}].quantity", index), "La cantidad debe ser mayor que cero");
            }
        }
        errors.finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SapDocumentLine<'a> {
    item_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_description: Option<&'a str>,
    quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    costing_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_code: Option<&'a str>,
}

/// Service layer document; `RequriedDate` is the service layer's own spelling
#[derive(Debug, Serialize)]
struct SapPurchaseRequest<'a> {
    #[serde(rename = "RequriedDate")]
    required_date: NaiveDate,
    #[serde(rename = "RequesterEmail", skip_serializing_if = "Option::is_none")]
    requester_email: Option<&'a str>,
    #[serde(rename = "Comments", skip_serializing_if = "Option::is_none")]
    comments: Option<&'a str>,
    #[serde(rename = "DocumentLines")]
    document_lines: Vec<SapDocumentLine<'a>>,
}

impl<'a> SapPurchaseRequest<'a> {
    fn from_input(input: &'a PurchaseRequestInput, requester_email: &'a str) -> Result<Self, IntegrationError> {
        let invalid = |message: &str| IntegrationError::InvalidResponse {
            service: SERVICE,
            message: message.to_string(),
        };
        let required_date = input.required_date.ok_or_else(|| invalid("fecha requerida ausente"))?;
        let document_lines = input
            .lines
            .iter()
            .map(|line| {
                Ok(SapDocumentLine {
                    item_code: line.item_code.as_deref().ok_or_else(|| invalid("línea sin artículo"))?,
                    item_description: line.description.as_deref(),
                    quantity: line
                        .quantity
                        .and_then(|q| q.to_f64())
                        .ok_or_else(|| invalid("línea sin cantidad"))?,
                    required_date: line.required_date.or(Some(required_date)),
                    costing_code: line.cost_center.as_deref(),
                    project_code: line.project.as_deref(),
                })
            })
            .collect::<Result<Vec<_>, IntegrationError>>()?;
        Ok(Self {
            required_date,
            requester_email: Some(input.requester_email.as_deref().unwrap_or(requester_email)),
            comments: input.comments.as_deref(),
            document_lines,
        })
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "CompanyDB")]
    company_db: &'a str,
    #[serde(rename = "UserName")]
    user_name: &'a str,
    #[serde(rename = "Password")]
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "SessionId")]
    session_id: String,
}

#[async_trait]
pub trait SapGateway: Send + Sync {
    fn companies(&self) -> Vec<String>;

    async fn create_purchase_request(
        &self,
        input: &PurchaseRequestInput,
        requester_email: &str,
    ) -> Result<Value, IntegrationError>;

    async fn get_purchase_request(&self, company: &str, doc_entry: i64) -> Result<Value, IntegrationError>;
}

pub struct ServiceLayerClient {
    client: reqwest::Client,
    companies: SapCompanies,
}

impl ServiceLayerClient {
    pub fn new(client: reqwest::Client, companies: SapCompanies) -> Self {
        Self { client, companies }
    }

    async fn login(&self, company: &SapCompany) -> Result<String, IntegrationError> {
        let response = self
            .client
            .post(endpoint(&company.base_url, "Login"))
            .json(&LoginRequest {
                company_db: &company.company_db,
                user_name: &company.username,
                password: &company.password,
            })
            .send()
            .await?;
        let login = ensure_success(SERVICE, response)
            .await?
            .json::<LoginResponse>()
            .await
            .map_err(|e| IntegrationError::InvalidResponse {
                service: SERVICE,
                message: e.to_string(),
            })?;
        tracing::debug!("SAP session opened for {}", company.company_db);
        Ok(login.session_id)
    }

    async fn logout(&self, company: &SapCompany, session: &str) {
        let result = self
            .client
            .post(endpoint(&company.base_url, "Logout"))
            .header(reqwest::header::COOKIE, session_cookie(session))
            .send()
            .await;
        if let Err(e) = result {
            tracing::warn!("SAP logout failed for {}: {}", company.company_db, e);
        }
    }

    async fn read_document(response: reqwest::Response) -> Result<Value, IntegrationError> {
        ensure_success(SERVICE, response)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| IntegrationError::InvalidResponse {
                service: SERVICE,
                message: e.to_string(),
            })
    }
}

fn session_cookie(session: &str) -> String {
    format!("B1SESSION={}", session)
}

#[async_trait]
impl SapGateway for ServiceLayerClient {
    fn companies(&self) -> Vec<String> {
        self.companies.names()
    }

    async fn create_purchase_request(
        &self,
        input: &PurchaseRequestInput,
        requester_email: &str,
    ) -> Result<Value, IntegrationError> {
        let code = input.company.as_deref().unwrap_or_default();
        let company = self.companies.get(code)?;
        let document = SapPurchaseRequest::from_input(input, requester_email)?;

        let session = self.login(company).await?;
        let response = self
            .client
            .post(endpoint(&company.base_url, "PurchaseRequests"))
            .header(reqwest::header::COOKIE, session_cookie(&session))
            .json(&document)
            .send()
            .await;
        let result = match response {
            Ok(response) => Self::read_document(response).await,
            Err(e) => Err(e.into()),
        };
        self.logout(company, &session).await;

        if let Ok(created) = &result {
            tracing::info!("SAP purchase request {} created in {}", created["DocEntry"], company.company_db);
        }
        result
    }

    async fn get_purchase_request(&self, company: &str, doc_entry: i64) -> Result<Value, IntegrationError> {
        let company = self.companies.get(company)?;
        let session = self.login(company).await?;
        let response = self
            .client
            .get(endpoint(&company.base_url, &format!("PurchaseRequests({})", doc_entry)))
            .header(reqwest::header::COOKIE, session_cookie(&session))
            .send()
            .await;
        let result = match response {
            Ok(response) => Self::read_document(response).await,
            Err(e) => Err(e.into()),
        };
        self.logout(company, &session).await;
        result
    }
}

pub fn from_config(config: &IntegrationsConfig) -> Result<Arc<dyn SapGateway>, IntegrationError> {
    let companies = SapCompanies::load_or_empty(config.sap_companies_file.as_deref());
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
        .danger_accept_invalid_certs(config.sap_accept_invalid_certs)
        .build()?;
    Ok(Arc::new(ServiceLayerClient::new(client, companies)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const YAML: &str = r#"
companies:
  demo:
    base_url: https://sap.example.com:50000/b1s/v1
    company_db: SBODEMO
    username: manager
    password: secreto
"#;

    fn input() -> PurchaseRequestInput {
        serde_json::from_value(json!({
            "company": "demo",
            "required_date": "2026-11-30",
            "comments": "Reposición de toner",
            "lines": [{ "item_code": "TON-01", "quantity": 3 }]
        }))
        .unwrap()
    }

    #[test]
    fn parses_company_file() {
        let companies = SapCompanies::from_yaml_str(YAML).unwrap();
        assert_eq!(companies.names(), vec!["demo".to_string()]);
        assert_eq!(companies.get("demo").unwrap().company_db, "SBODEMO");
        assert!(matches!(companies.get("otra"), Err(IntegrationError::UnknownCompany(_))));
    }

    #[test]
    fn debug_output_hides_password() {
        let companies = SapCompanies::from_yaml_str(YAML).unwrap();
        let printed = format!("{:?}", companies);
        assert!(!printed.contains("secreto"));
    }

    #[test]
    fn missing_file_yields_no_companies() {
        let companies = SapCompanies::load_or_empty(Some("/nonexistent/sap.yaml"));
        assert!(companies.companies.is_empty());
    }

    #[test]
    fn document_uses_service_layer_names() {
        let input = input();
        assert!(input.validate().is_ok());
        let document = SapPurchaseRequest::from_input(&input, "ana@empresa.com").unwrap();
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["RequriedDate"], "2026-11-30");
        assert_eq!(value["RequesterEmail"], "ana@empresa.com");
        assert_eq!(value["DocumentLines"][0]["ItemCode"], "TON-01");
        assert_eq!(value["DocumentLines"][0]["Quantity"], 3.0);
        assert_eq!(value["DocumentLines"][0]["RequiredDate"], "2026-11-30");
        assert!(value["DocumentLines"][0].get("CostingCode").is_none());
    }

    #[test]
    fn lines_need_item_and_positive_quantity() {
        let mut input = input();
        input.lines[0].quantity = Some(Decimal::ZERO);
        input.lines[0].item_code = None;
        let body = input.validate().unwrap_err().to_json();
        assert!(body["field_errors"].get("lines[0].quantity").is_some());
        assert!(body["field_errors"].get("lines[0].item_code").is_some());
    }

    #[test]
    fn session_cookie_format() {
        assert_eq!(session_cookie("abc-123"), "B1SESSION=abc-123");
    }
}
