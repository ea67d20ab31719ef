//! AWS SDK clients, the live lookups the compiler needs before rendering, and
//! the trust-store upload target.
//!
//! The engine resolves most cloud values itself. ACM validation records are
//! the exception: the unit must declare one record per option, so the options
//! are read here first.

pub mod acm;
pub mod clients;
pub mod s3;

pub use acm::{collect_validation_options, AcmLookup, CertificateLookup, FileLookup};
pub use clients::AwsClients;
pub use s3::{ObjectStore, PutObject, S3Store};
