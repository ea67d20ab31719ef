//! Names of the outputs each unit exports for other units to reference.
//!
//! Output keys are plain strings once deployed; keeping them in one enum stops
//! a producer and its consumers from drifting apart. The informational outputs
//! keep the names existing deployments already read.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An exported stack output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputKey {
    // -- mtls-infra ---------------------------------------------------------
    ApiDomain,
    ApiDomainMtls,
    SubDomain,
    SubDomainMtls,
    ApiCertArn,
    ApiCertArnMtls,
    TruststoreBucketName,
    TruststoreObjectKey,
    ApiZoneId,
    #[serde(rename = "api_dns_nameservers")]
    ApiDnsNameservers,

    // -- functions ----------------------------------------------------------
    PingLambdaFunctionName,
    PingLambdaFunctionArn,

    // -- API units ----------------------------------------------------------
    ApiGatewayCustomDomainName,
    ApiGatewayCustomDomainNameMtls,
    #[serde(rename = "DNS_A_Record")]
    DnsARecord,
    #[serde(rename = "DNS_AAAA_Record")]
    DnsAaaaRecord,
    #[serde(rename = "DNS_A_Record_Mtls")]
    DnsARecordMtls,
    #[serde(rename = "DNS_AAAA_Record_Mtls")]
    DnsAaaaRecordMtls,
}

impl OutputKey {
    /// The key under which the engine stores this output.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputKey::ApiDomain => "apiDomain",
            OutputKey::ApiDomainMtls => "apiDomainMtls",
            OutputKey::SubDomain => "subDomain",
            OutputKey::SubDomainMtls => "subDomainMtls",
            OutputKey::ApiCertArn => "apiCertArn",
            OutputKey::ApiCertArnMtls => "apiCertArnMtls",
            OutputKey::TruststoreBucketName => "truststoreBucketName",
            OutputKey::TruststoreObjectKey => "truststoreObjectKey",
            OutputKey::ApiZoneId => "apiZoneId",
            OutputKey::ApiDnsNameservers => "api_dns_nameservers",
            OutputKey::PingLambdaFunctionName => "pingLambdaFunctionName",
            OutputKey::PingLambdaFunctionArn => "pingLambdaFunctionArn",
            OutputKey::ApiGatewayCustomDomainName => "apiGatewayCustomDomainName",
            OutputKey::ApiGatewayCustomDomainNameMtls => "apiGatewayCustomDomainNameMtls",
            OutputKey::DnsARecord => "DNS_A_Record",
            OutputKey::DnsAaaaRecord => "DNS_AAAA_Record",
            OutputKey::DnsARecordMtls => "DNS_A_Record_Mtls",
            OutputKey::DnsAaaaRecordMtls => "DNS_AAAA_Record_Mtls",
        }
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
