//! `mtls-infra`: certificates, their validation records, and the truststore.

use std::path::PathBuf;

use common::{OutputKey, StackError};

use super::{dns, Inputs, StackContext};
use crate::config::{Config, ConfigKey};
use crate::resource::{Invoke, Program, Resource, ResourceKind, Value};

/// Object key the trust-store bundle is stored under.
pub const TRUSTSTORE_OBJECT_KEY: &str = "ca.pem";

/// Key algorithm requested for both certificates.
pub const CERTIFICATE_KEY_ALGORITHM: &str = "EC_prime256v1";

/// Configuration read by the unit.
#[derive(Debug, Clone)]
pub struct Settings {
    pub hosted_zone_name: String,
    pub sub_domain: String,
    pub sub_domain_mtls: String,
    pub api_domain: String,
    pub api_domain_mtls: String,
    pub truststore_pem_path: PathBuf,
}

impl Settings {
    /// # Errors
    ///
    /// Returns [`StackError::MissingConfig`] for the first absent key.
    pub fn from_config(cfg: &Config) -> Result<Self, StackError> {
        Ok(Self {
            hosted_zone_name: cfg.require(ConfigKey::HostedZoneName)?.to_owned(),
            sub_domain: cfg.require(ConfigKey::SubDomain)?.to_owned(),
            sub_domain_mtls: cfg.require(ConfigKey::SubDomainMtls)?.to_owned(),
            api_domain: cfg.require(ConfigKey::ApiDomain)?.to_owned(),
            api_domain_mtls: cfg.require(ConfigKey::ApiDomainMtls)?.to_owned(),
            truststore_pem_path: cfg.truststore_pem_path.clone(),
        })
    }

    /// Name of the bucket holding the trust store.
    pub fn truststore_bucket_name(&self) -> String {
        format!("{}-ts-bckt", self.api_domain_mtls)
    }
}

/// Declare the unit.
pub fn build(ctx: &StackContext, settings: &Settings, inputs: &Inputs) -> Program {
    let mut program = Program::new(
        ctx.unit.as_str(),
        "ACM certificates, DNS validation records and the mTLS truststore bucket",
    );

    let zone = program.invoke(
        "apiZone",
        Invoke::new("aws:route53:getZone").arg("name", settings.hosted_zone_name.as_str()),
    );

    let certificate = |id: &str, domain: &str| {
        Resource::new(id, format!("{domain}-cert"), ResourceKind::AcmCertificate)
            .prop("domainName", domain)
            .prop("validationMethod", "DNS")
            .prop("keyAlgorithm", CERTIFICATE_KEY_ALGORITHM)
            .retain_on_delete()
    };

    let api_cert = program.add(certificate("apiCert", &settings.api_domain));
    let api_cert_mtls = program.add(certificate("apiCertMtls", &settings.api_domain_mtls));

    for (domain, cert) in [
        (&settings.api_domain, &api_cert),
        (&settings.api_domain_mtls, &api_cert_mtls),
    ] {
        for record in dns::validation_records(domain, cert, &zone, inputs.options_for(domain)) {
            program.add(record);
        }
    }

    let bucket_name = settings.truststore_bucket_name();
    let bucket = program.add(
        Resource::new("truststoreBucket", bucket_name.clone(), ResourceKind::S3Bucket)
            .prop("bucket", bucket_name)
            .prop("acl", "private"),
    );

    let mut object = Resource::new(
        "truststoreBucketObject",
        format!("{}-trust-store-pem", settings.api_domain_mtls),
        ResourceKind::S3BucketObject,
    )
    .prop("key", TRUSTSTORE_OBJECT_KEY)
    .prop("bucket", bucket.attr("id"))
    .prop("source", Value::FileAsset(settings.truststore_pem_path.clone()));
    if let Some(hash) = &inputs.truststore_sha256 {
        object = object.prop("sourceHash", hash.as_str());
    }
    let object = program.add(object);

    program.export(OutputKey::TruststoreBucketName, bucket.attr("id"));
    program.export(OutputKey::TruststoreObjectKey, object.attr("key"));
    program.export(OutputKey::ApiDnsNameservers, zone.attr("nameServers"));
    program.export(OutputKey::ApiZoneId, zone.attr("zoneId"));
    program.export(OutputKey::ApiCertArn, api_cert.attr("arn"));
    program.export(OutputKey::ApiCertArnMtls, api_cert_mtls.attr("arn"));
    program.export(OutputKey::ApiDomain, settings.api_domain.as_str());
    program.export(OutputKey::SubDomain, settings.sub_domain.as_str());
    program.export(OutputKey::ApiDomainMtls, settings.api_domain_mtls.as_str());
    program.export(OutputKey::SubDomainMtls, settings.sub_domain_mtls.as_str());

    program
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::DependencyGraph;
    use crate::units::tests::full_config;
    use crate::units::{DomainValidationOption, Unit};

    fn option(domain: &str, n: usize) -> DomainValidationOption {
        DomainValidationOption {
            domain_name: domain.into(),
            resource_record_type: "CNAME".into(),
            resource_record_name: format!("_a{n}.{domain}."),
            resource_record_value: format!("_b{n}.acm-validations.aws."),
        }
    }

    fn compile(inputs: &Inputs) -> Program {
        let cfg = full_config();
        let settings = Settings::from_config(&cfg).unwrap();
        let ctx = StackContext::new("acme", Unit::MtlsInfra, "dev");
        build(&ctx, &settings, inputs)
    }

    #[test]
    fn certificates_are_retained_and_dns_validated() {
        let program = compile(&Inputs::default());
        let certs: Vec<_> = program.resources_of(ResourceKind::AcmCertificate).collect();
        assert_eq!(certs.len(), 2);
        for cert in certs {
            assert!(cert.options.retain_on_delete);
            assert_eq!(cert.property("validationMethod").and_then(Value::as_str), Some("DNS"));
            assert_eq!(
                cert.property("keyAlgorithm").and_then(Value::as_str),
                Some("EC_prime256v1")
            );
        }
        assert_eq!(program.resource("apiCert").unwrap().name, "api.example.com-cert");
        assert_eq!(program.resource("apiCertMtls").unwrap().name, "mtls.example.com-cert");
    }

    #[test]
    fn validation_records_depend_on_their_own_certificate() {
        let mut inputs = Inputs::default();
        inputs
            .validation_options
            .insert("api.example.com".into(), vec![option("api.example.com", 1)]);
        inputs.validation_options.insert(
            "mtls.example.com".into(),
            vec![option("mtls.example.com", 1), option("mtls.example.com", 2)],
        );
        let program = compile(&inputs);

        let records: Vec<_> = program.resources_of(ResourceKind::Route53Record).collect();
        assert_eq!(records.len(), 3);
        let mtls: Vec<_> = records
            .iter()
            .filter(|r| r.name.starts_with("mtls.example.com-dns-validation-record-"))
            .collect();
        assert_eq!(mtls.len(), 2);
        for record in mtls {
            assert_eq!(record.options.depends_on, vec!["apiCertMtls".to_string()]);
        }
        DependencyGraph::build(&program).unwrap();
    }

    #[test]
    fn truststore_bucket_and_object() {
        let inputs = Inputs {
            truststore_sha256: Some("00ff".into()),
            ..Inputs::default()
        };
        let program = compile(&inputs);

        let bucket = program.resource("truststoreBucket").unwrap();
        assert_eq!(bucket.name, "mtls.example.com-ts-bckt");
        assert_eq!(bucket.property("bucket").and_then(Value::as_str), Some("mtls.example.com-ts-bckt"));
        assert_eq!(bucket.property("acl").and_then(Value::as_str), Some("private"));

        let object = program.resource("truststoreBucketObject").unwrap();
        assert_eq!(object.property("key").and_then(Value::as_str), Some("ca.pem"));
        assert_eq!(object.property("sourceHash").and_then(Value::as_str), Some("00ff"));
        assert_eq!(
            object.property("source"),
            Some(&Value::FileAsset(PathBuf::from("ca.pem")))
        );
    }

    #[test]
    fn exports_cross_stack_outputs() {
        let program = compile(&Inputs::default());
        for key in [
            OutputKey::ApiDomain,
            OutputKey::ApiDomainMtls,
            OutputKey::ApiCertArn,
            OutputKey::ApiCertArnMtls,
            OutputKey::TruststoreBucketName,
            OutputKey::TruststoreObjectKey,
        ] {
            assert!(program.outputs.contains_key(&key), "missing {key}");
        }
        assert_eq!(
            program.outputs[&OutputKey::ApiDomainMtls].as_str(),
            Some("mtls.example.com")
        );
    }
}
