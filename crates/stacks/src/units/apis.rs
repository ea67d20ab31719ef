//! `mtls-apis` and `non-mtls-apis`: custom domain, DNS, and the ping API.
//!
//! Both variants declare the same chain:
//!
//! ```text
//! Api ─► Permission
//!  └──► Integration ─► Route ─► Stage ─► Mapping ◄── DomainName ◄── A / AAAA
//! ```
//!
//! The mTLS variant additionally points the custom domain at the truststore
//! exported by `mtls-infra`.

use common::{OutputKey, StackError};

use super::{dns, StackContext, Unit};
use crate::config::{Config, ConfigKey};
use crate::resource::{Invoke, Program, Resource, ResourceKind, Segment, Value};

/// Route served by the ping Lambda.
pub const PING_ROUTE_KEY: &str = "GET /v1/ping";

/// Which flavour of API unit to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVariant {
    Mtls,
    Plain,
}

impl ApiVariant {
    /// Prefix for logical names, keeping the two units' names apart.
    fn name_prefix(self) -> &'static str {
        match self {
            ApiVariant::Mtls => "MTLS-",
            ApiVariant::Plain => "",
        }
    }

    fn domain_key(self) -> ConfigKey {
        match self {
            ApiVariant::Mtls => ConfigKey::ApiDomainMtls,
            ApiVariant::Plain => ConfigKey::ApiDomain,
        }
    }

    fn unit(self) -> Unit {
        match self {
            ApiVariant::Mtls => Unit::MtlsApis,
            ApiVariant::Plain => Unit::NonMtlsApis,
        }
    }
}

/// Configuration read by the unit.
#[derive(Debug, Clone)]
pub struct Settings {
    pub variant: ApiVariant,
    pub hosted_zone_name: String,
    /// Custom domain served by this API.
    pub domain: String,
}

impl Settings {
    /// # Errors
    ///
    /// Returns [`StackError::MissingConfig`] for the first absent key the
    /// variant requires.
    pub fn from_config(cfg: &Config, variant: ApiVariant) -> Result<Self, StackError> {
        for key in variant.unit().required_keys() {
            cfg.require(*key)?;
        }
        Ok(Self {
            variant,
            hosted_zone_name: cfg.require(ConfigKey::HostedZoneName)?.to_owned(),
            domain: cfg.require(variant.domain_key())?.to_owned(),
        })
    }
}

/// Declare the unit.
pub fn build(ctx: &StackContext, settings: &Settings) -> Program {
    let suffix = ctx.suffix();
    let stack = ctx.stack.as_str();
    let prefix = settings.variant.name_prefix();
    let mtls = settings.variant == ApiVariant::Mtls;

    let (description, integration_description, stage_description, outputs) = if mtls {
        (
            "An API to test the MTLS integration",
            "MTLS Integration between API gateway and the Ping lambda function",
            format!("{suffix} stage for the testing of the mtls"),
            [
                OutputKey::ApiGatewayCustomDomainNameMtls,
                OutputKey::DnsARecordMtls,
                OutputKey::DnsAaaaRecordMtls,
            ],
        )
    } else {
        (
            "An API to test the normal i.e. non-MTLS integration",
            "Integration between API gateway and the Ping lambda function, the normal scenario i.e. non-mtls",
            format!("{suffix} stage for the testing normal i.e. non-mtls"),
            [
                OutputKey::ApiGatewayCustomDomainName,
                OutputKey::DnsARecord,
                OutputKey::DnsAaaaRecord,
            ],
        )
    };

    let mut program = Program::new(ctx.unit.as_str(), description);

    let infra = ctx.reference(&mut program, "infraRef", Unit::MtlsInfra);
    let functions = ctx.reference(&mut program, "functionsRef", Unit::Functions);

    let zone = program.invoke(
        "apiZone",
        Invoke::new("aws:route53:getZone").arg("name", settings.hosted_zone_name.as_str()),
    );

    // -----------------------------------------------------------------------
    // Custom domain + DNS
    // -----------------------------------------------------------------------
    let (domain_output, cert_output) = if mtls {
        (OutputKey::ApiDomainMtls, OutputKey::ApiCertArnMtls)
    } else {
        (OutputKey::ApiDomain, OutputKey::ApiCertArn)
    };

    let mut custom_domain = Resource::new(
        "apiGatewayDomain",
        settings.domain.as_str(),
        ResourceKind::ApiGatewayDomainName,
    )
    .prop("domainName", infra.output(domain_output))
    .prop(
        "domainNameConfiguration",
        Value::map([
            ("endpointType", Value::from("REGIONAL")),
            ("securityPolicy", Value::from("TLS_1_2")),
            ("certificateArn", Value::from(infra.output(cert_output))),
        ]),
    );
    if mtls {
        custom_domain = custom_domain.prop(
            "mutualTlsAuthentication",
            Value::map([(
                "truststoreUri",
                Value::Interpolate(vec![
                    Segment::Text("s3://".into()),
                    Segment::Ref(infra.output(OutputKey::TruststoreBucketName)),
                    Segment::Text("/".into()),
                    Segment::Ref(infra.output(OutputKey::TruststoreObjectKey)),
                ]),
            )]),
        );
    }
    let custom_domain = program.add(custom_domain);

    let [a_record, aaaa_record] = dns::alias_records("api", &settings.domain, &zone, &custom_domain);
    let a_record = program.add(a_record);
    let aaaa_record = program.add(aaaa_record);

    // -----------------------------------------------------------------------
    // API → Lambda wiring
    // -----------------------------------------------------------------------
    let api = program.add(
        Resource::new(
            "pingApi",
            format!("{prefix}Ping-Api-Gateway{suffix}"),
            ResourceKind::ApiGatewayApi,
        )
        .prop("protocolType", "HTTP")
        .prop("disableExecuteApiEndpoint", true)
        .prop("name", format!("{prefix}Ping-API{suffix}"))
        .prop("description", description),
    );

    program.add(
        Resource::new(
            "pingLambdaPermission",
            format!("{prefix}Lambda-Permission-Ping-Api{suffix}"),
            ResourceKind::LambdaPermission,
        )
        .prop("action", "lambda:InvokeFunction")
        .prop("principal", "apigateway.amazonaws.com")
        .prop("function", functions.output(OutputKey::PingLambdaFunctionName))
        .prop(
            "sourceArn",
            Value::Interpolate(vec![
                Segment::Ref(api.attr("executionArn")),
                Segment::Text("/*/*".into()),
            ]),
        )
        .depends_on(&api),
    );

    let integration = program.add(
        Resource::new(
            "pingIntegration",
            format!("{prefix}Lambda-Integration-Ping-Api{suffix}"),
            ResourceKind::ApiGatewayIntegration,
        )
        .prop("apiId", api.attr("id"))
        .prop("integrationType", "AWS_PROXY")
        .prop("integrationUri", functions.output(OutputKey::PingLambdaFunctionArn))
        .prop("integrationMethod", "GET")
        .prop("payloadFormatVersion", "2.0")
        .prop("passthroughBehavior", "WHEN_NO_MATCH")
        .prop("description", integration_description),
    );

    let route = program.add(
        Resource::new(
            "pingRoute",
            format!("{prefix}API-Route-Ping{suffix}"),
            ResourceKind::ApiGatewayRoute,
        )
        .prop("apiId", api.attr("id"))
        .prop("routeKey", PING_ROUTE_KEY)
        .prop(
            "target",
            Value::Interpolate(vec![
                Segment::Text("integrations/".into()),
                Segment::Ref(integration.attr("id")),
            ]),
        ),
    );

    let stage = program.add(
        Resource::new(
            "pingStage",
            format!("{prefix}API-Stage-Ping-Api{suffix}"),
            ResourceKind::ApiGatewayStage,
        )
        .prop("apiId", api.attr("id"))
        .prop("name", stack)
        .prop("autoDeploy", true)
        .prop("description", stage_description)
        .depends_on(&route),
    );

    program.add(
        Resource::new(
            "pingApiMapping",
            format!("{prefix}API-Mapping-Ping-Api{suffix}"),
            ResourceKind::ApiGatewayApiMapping,
        )
        .prop("domainName", custom_domain.attr("domainName"))
        .prop("apiId", api.attr("id"))
        .prop("stage", stage.attr("id")),
    );

    let [domain_key, a_key, aaaa_key] = outputs;
    program.export(domain_key, custom_domain.attr("domainName"));
    program.export(a_key, a_record.reference());
    program.export(aaaa_key, aaaa_record.reference());

    program
}
