/// Application name used for the default assembly directory and logs
pub const APP_NAME: &str = "vttcloud";

/// Environment variable holding the deployment stage
pub const STAGE_ENV: &str = "STAGE";

/// Environment variable holding the project name
pub const PROJECT_ENV: &str = "PROJECT";

/// Environment variable overriding the Foundry credentials secret ARN
pub const SECRET_ARN_ENV: &str = "FOUNDRY_SECRET_ARN";

/// Stage used when `STAGE` is unset or empty
pub const DEFAULT_STAGE: &str = "Dev";

/// Lowercase stage default used by the older network/filesystem deployments
pub const LEGACY_DEFAULT_STAGE: &str = "dev";

/// Project used when `PROJECT` is unset or empty
pub const DEFAULT_PROJECT: &str = "FoundryVtt";

/// Secrets Manager entry holding the Foundry license credentials
pub const DEFAULT_SECRET_ARN: &str = "arn:aws:secretsmanager:us-east-2:334037273999:secret:foundry-data-YrCi56";

/// Port the Foundry VTT container listens on
pub const FOUNDRY_PORT: u16 = 30000;

/// Container image published for Foundry VTT
pub const FOUNDRY_IMAGE: &str = "felddy/foundryvtt:release";

/// CloudFormation template format version
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// IAM policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// Length of the truncated content hash stored in assembly manifests
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Current assembly manifest schema version
pub const ASSEMBLY_VERSION: u32 = 1;

/// Default output directory for synthesized assemblies
pub const DEFAULT_ASSEMBLY_DIR: &str = "cdk.out";
