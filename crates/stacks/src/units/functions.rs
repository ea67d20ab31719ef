//! `functions`: the ping Lambda and its execution role.

use std::path::PathBuf;

use common::OutputKey;
use serde_json::json;

use super::StackContext;
use crate::config::Config;
use crate::resource::{Program, Resource, ResourceKind, Value};

/// Managed policy granting CloudWatch Logs access to the function.
pub const BASIC_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory packaged as the function's code archive.
    pub code_path: PathBuf,
    pub runtime: String,
    pub handler: String,
}

impl Settings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            code_path: cfg.ping_code_path.clone(),
            runtime: cfg.lambda_runtime.clone(),
            handler: cfg.lambda_handler.clone(),
        }
    }
}

/// Trust policy letting the Lambda service assume the execution role.
fn assume_role_policy() -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Action": "sts:AssumeRole",
            "Principal": { "Service": "lambda.amazonaws.com" },
            "Effect": "Allow",
            "Sid": "",
        }],
    })
    .to_string()
}

/// Declare the unit.
pub fn build(ctx: &StackContext, settings: &Settings) -> Program {
    let suffix = ctx.suffix();
    let mut program = Program::new(ctx.unit.as_str(), "The ping Lambda function and its execution role");

    let role = program.add(
        Resource::new("lambdaRole", format!("Role-Functions-Api{suffix}"), ResourceKind::IamRole)
            .prop("assumeRolePolicy", assume_role_policy()),
    );

    program.add(
        Resource::new(
            "lambdaRoleAttachment",
            format!("Role-Attachment-Api{suffix}"),
            ResourceKind::IamRolePolicyAttachment,
        )
        .prop("role", role.attr("name"))
        .prop("policyArn", BASIC_EXECUTION_POLICY_ARN),
    );

    let ping = program.add(
        Resource::new("pingLambda", format!("Ping-Function{suffix}"), ResourceKind::LambdaFunction)
            .prop("code", Value::FileArchive(settings.code_path.clone()))
            .prop("runtime", settings.runtime.as_str())
            .prop("role", role.attr("arn"))
            .prop("handler", settings.handler.as_str())
            .prop("publish", true),
    );

    program.export(OutputKey::PingLambdaFunctionName, ping.attr("name"));
    program.export(OutputKey::PingLambdaFunctionArn, ping.attr("arn"));
    program
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::units::Unit;

    fn program() -> Program {
        let cfg = Config::for_stack("acme", "dev");
        build(
            &StackContext::new("acme", Unit::Functions, "dev"),
            &Settings::from_config(&cfg),
        )
    }

    #[test]
    fn role_trusts_lambda_service() {
        let program = program();
        let role = program.resource("lambdaRole").unwrap();
        assert_eq!(role.name, "Role-Functions-Api-functions-dev");
        let policy: serde_json::Value =
            serde_json::from_str(role.property("assumeRolePolicy").and_then(Value::as_str).unwrap())
                .unwrap();
        assert_eq!(policy["Statement"][0]["Principal"]["Service"], "lambda.amazonaws.com");
        assert_eq!(policy["Statement"][0]["Action"], "sts:AssumeRole");
    }

    #[test]
    fn function_uses_role_and_archive() {
        let program = program();
        let f = program.resource("pingLambda").unwrap();
        assert_eq!(f.name, "Ping-Function-functions-dev");
        assert_eq!(f.property("role").and_then(Value::as_reference).map(|r| r.expr()), Some("${lambdaRole.arn}".to_string()));
        assert_eq!(f.property("publish"), Some(&Value::Bool(true)));
        assert!(matches!(f.property("code"), Some(Value::FileArchive(_))));
        assert_eq!(f.property("runtime").and_then(Value::as_str), Some("provided.al2023"));
        assert_eq!(f.property("handler").and_then(Value::as_str), Some("bootstrap"));
    }

    #[test]
    fn exports_name_and_arn() {
        let program = program();
        assert!(program.outputs.contains_key(&OutputKey::PingLambdaFunctionName));
        assert!(program.outputs.contains_key(&OutputKey::PingLambdaFunctionArn));
    }
}
