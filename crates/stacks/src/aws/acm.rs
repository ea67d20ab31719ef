//! Certificate validation-option lookups.
//!
//! ACM only publishes DNS validation records after a certificate has been
//! requested, so the first compile of `mtls-infra` declares the certificates
//! without records and a later compile adds them.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use aws_sdk_acm::error::DisplayErrorContext;
use aws_sdk_acm::types::{CertificateDetail, CertificateSummary, Filters, KeyAlgorithm};
use common::StackError;
#[cfg(test)]
use mockall::automock;
use tracing::{debug, info, warn};

use crate::units::mtls_infra::CERTIFICATE_KEY_ALGORITHM;
use crate::units::DomainValidationOption;

/// Source of the DNS validation options for a certificate domain.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CertificateLookup: Send + Sync {
    /// Validation options of the certificate issued for `domain`; empty if the
    /// certificate has not been requested yet.
    async fn validation_options(
        &self,
        domain: &str,
    ) -> Result<Vec<DomainValidationOption>, StackError>;
}

/// Gather validation options for every domain in `domains`.
///
/// # Errors
///
/// Propagates the first lookup failure.
pub async fn collect_validation_options(
    lookup: &dyn CertificateLookup,
    domains: &[&str],
) -> Result<BTreeMap<String, Vec<DomainValidationOption>>, StackError> {
    let mut out = BTreeMap::new();
    for domain in domains {
        let options = lookup.validation_options(domain).await?;
        if options.is_empty() {
            warn!(
                domain,
                "no validation options yet; compile again once the certificate has been requested"
            );
        } else {
            info!(domain, count = options.len(), "validation options found");
        }
        out.insert((*domain).to_owned(), options);
    }
    Ok(out)
}

/// One page of `ListCertificates`.
#[derive(Debug, Clone, Default)]
pub struct CertificatePage {
    pub summaries: Vec<CertificateSummary>,
    pub next_token: Option<String>,
}

/// The two ACM calls the lookup needs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CertificateCatalog: Send + Sync {
    /// List certificates with the key algorithm the units request.
    async fn list_page(&self, next_token: Option<String>) -> Result<CertificatePage, StackError>;

    async fn describe(&self, arn: String) -> Result<Option<CertificateDetail>, StackError>;
}

#[async_trait]
impl CertificateCatalog for aws_sdk_acm::Client {
    async fn list_page(&self, next_token: Option<String>) -> Result<CertificatePage, StackError> {
        // ListCertificates only returns RSA_2048 certificates unless told otherwise.
        let filters = Filters::builder()
            .key_types(KeyAlgorithm::from(CERTIFICATE_KEY_ALGORITHM))
            .build();
        let page = self
            .list_certificates()
            .includes(filters)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                StackError::Lookup(format!("list ACM certificates: {}", DisplayErrorContext(&e)))
            })?;
        Ok(CertificatePage {
            summaries: page.certificate_summary_list().to_vec(),
            next_token: page.next_token().map(str::to_owned),
        })
    }

    async fn describe(&self, arn: String) -> Result<Option<CertificateDetail>, StackError> {
        let described = self
            .describe_certificate()
            .certificate_arn(&arn)
            .send()
            .await
            .map_err(|e| {
                StackError::Lookup(format!("describe certificate {arn}: {}", DisplayErrorContext(&e)))
            })?;
        Ok(described.certificate().cloned())
    }
}

/// Reads validation options from ACM.
pub struct AcmLookup<C = aws_sdk_acm::Client> {
    catalog: C,
}

impl<C: CertificateCatalog> AcmLookup<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// ARN of the newest certificate for `domain`.
    ///
    /// Certificates are retained on delete, so older ones for the same domain
    /// may still be listed.
    async fn newest_certificate(&self, domain: &str) -> Result<Option<String>, StackError> {
        let mut newest: Option<(i64, String)> = None;
        let mut next_token: Option<String> = None;
        loop {
            let page = self.catalog.list_page(next_token.take()).await?;

            for summary in &page.summaries {
                if let Some(candidate) = matching(summary, domain) {
                    if newest.as_ref().map_or(true, |(at, _)| candidate.0 > *at) {
                        newest = Some(candidate);
                    }
                }
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }
        Ok(newest.map(|(_, arn)| arn))
    }
}

/// `(created_at, arn)` of `summary` if it was issued for `domain`.
fn matching(summary: &CertificateSummary, domain: &str) -> Option<(i64, String)> {
    if summary.domain_name() != Some(domain) {
        return None;
    }
    let arn = summary.certificate_arn()?.to_owned();
    let created = summary.created_at().map(|t| t.secs()).unwrap_or(i64::MIN);
    Some((created, arn))
}

/// DNS validation options published on `detail`.
fn options_from_detail(detail: &CertificateDetail) -> Vec<DomainValidationOption> {
    let mut options = Vec::new();
    for validation in detail.domain_validation_options() {
        match validation.resource_record() {
            Some(record) => options.push(DomainValidationOption {
                domain_name: validation.domain_name().to_owned(),
                resource_record_type: record.r#type().as_str().to_owned(),
                resource_record_name: record.name().to_owned(),
                resource_record_value: record.value().to_owned(),
            }),
            None => warn!(
                domain = validation.domain_name(),
                "validation record not generated yet"
            ),
        }
    }
    options
}

#[async_trait]
impl<C: CertificateCatalog> CertificateLookup for AcmLookup<C> {
    async fn validation_options(
        &self,
        domain: &str,
    ) -> Result<Vec<DomainValidationOption>, StackError> {
        let Some(arn) = self.newest_certificate(domain).await? else {
            return Ok(Vec::new());
        };
        debug!(domain, arn = %arn, "describing certificate");

        Ok(self
            .catalog
            .describe(arn)
            .await?
            .map(|detail| options_from_detail(&detail))
            .unwrap_or_default())
    }
}

/// Reads validation options from a JSON file mapping domain → options.
///
/// Lets a unit be compiled without AWS credentials.
#[derive(Debug, Default)]
pub struct FileLookup {
    options: BTreeMap<String, Vec<DomainValidationOption>>,
}

impl FileLookup {
    /// # Errors
    ///
    /// Returns [`StackError::Lookup`] if the file is unreadable or not the
    /// expected JSON shape.
    pub fn load(path: &Path) -> Result<Self, StackError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StackError::Lookup(format!("{}: {e}", path.display())))?;
        let options = serde_json::from_str(&text)
            .map_err(|e| StackError::Lookup(format!("{}: {e}", path.display())))?;
        Ok(Self { options })
    }
}

#[async_trait]
impl CertificateLookup for FileLookup {
    async fn validation_options(
        &self,
        domain: &str,
    ) -> Result<Vec<DomainValidationOption>, StackError> {
        Ok(self.options.get(domain).cloned().unwrap_or_default())
    }
}
