//! Route53 record declarations: ACM validation records and API alias records.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::resource::{Handle, Resource, ResourceKind, Value};

/// TTL, in seconds, of every DNS validation record.
pub const VALIDATION_RECORD_TTL: i64 = 600;

/// One DNS record ACM asks for to prove control of a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainValidationOption {
    pub domain_name: String,
    pub resource_record_type: String,
    pub resource_record_name: String,
    pub resource_record_value: String,
}

/// Declare one validation record per option of `certificate`.
///
/// Records are numbered from 1 in option order and never overwrite an
/// existing record. Duplicate options are not collapsed; the provider rejects
/// the second record instead.
pub fn validation_records(
    domain: &str,
    certificate: &Handle,
    zone: &Handle,
    options: &[DomainValidationOption],
) -> Vec<Resource> {
    options
        .iter()
        .enumerate()
        .map(|(idx, option)| {
            let ordinal = idx + 1;
            info!(
                ordinal,
                domain,
                record_type = %option.resource_record_type,
                record_name = %option.resource_record_name,
                "declaring certificate validation record"
            );
            Resource::new(
                format!("{}Validation{ordinal}", certificate.id()),
                format!("{domain}-dns-validation-record-{ordinal}"),
                ResourceKind::Route53Record,
            )
            .prop("type", option.resource_record_type.as_str())
            .prop("zoneId", zone.attr("zoneId"))
            .prop("name", option.resource_record_name.as_str())
            .prop("ttl", VALIDATION_RECORD_TTL)
            .prop(
                "records",
                vec![Value::from(option.resource_record_value.as_str())],
            )
            .prop("allowOverwrite", false)
            .depends_on(certificate)
        })
        .collect()
}

/// Declare the `A` and `AAAA` alias records pointing `domain` at the regional
/// endpoint of `custom_domain`.
///
/// `id_prefix` keeps the record identifiers distinct between API variants.
pub fn alias_records(
    id_prefix: &str,
    domain: &str,
    zone: &Handle,
    custom_domain: &Handle,
) -> [Resource; 2] {
    let alias = |record_type: &str, id: String| {
        let target = Value::map([
            (
                "zoneId",
                Value::from(
                    custom_domain
                        .attr("domainNameConfiguration")
                        .field("hostedZoneId"),
                ),
            ),
            (
                "name",
                Value::from(
                    custom_domain
                        .attr("domainNameConfiguration")
                        .field("targetDomainName"),
                ),
            ),
            ("evaluateTargetHealth", Value::from(false)),
        ]);
        Resource::new(
            id,
            format!("{domain}-{record_type}-record"),
            ResourceKind::Route53Record,
        )
        .prop("type", record_type)
        .prop("name", domain)
        .prop("zoneId", zone.attr("zoneId"))
        .prop("allowOverwrite", false)
        .prop("aliases", vec![target])
    };

    [
        alias("A", format!("{id_prefix}ARecord")),
        alias("AAAA", format!("{id_prefix}AaaaRecord")),
    ]
}
