//! AWS SDK client bundle.

use aws_config::BehaviorVersion;

/// Bundle of AWS SDK clients sharing one resolved [`aws_config::SdkConfig`].
///
/// Credentials and region come from the standard provider chain
/// (`AWS_PROFILE`, `AWS_REGION`, instance/SSO credentials, ...).
#[derive(Clone)]
pub struct AwsClients {
    /// ACM client used to read certificate validation options.
    pub acm: aws_sdk_acm::Client,
    /// S3 client used to upload the trust-store bundle.
    pub s3: aws_sdk_s3::Client,
}

impl AwsClients {
    /// Load the shared SDK configuration and build every client from it.
    pub async fn init() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            acm: aws_sdk_acm::Client::new(&config),
            s3: aws_sdk_s3::Client::new(&config),
        }
    }
}
