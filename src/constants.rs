use std::{env, path::PathBuf};

use dirs;

/// Profile used when none is given on the command line
pub const DEFAULT_PROFILE: &str = "default";

/// Appended to a base profile name to form its short-term counterpart
pub const SHORT_TERM_SUFFIX: &str = "-short-term";

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// AWS shared credentials file name
pub const AWS_CREDENTIALS_FILE_NAME: &str = "credentials";

/// Default AWS region for STS operations when no region is configured
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Session token lifetime when `--duration` is not given (12 hours)
pub const DEFAULT_SESSION_TOKEN_DURATION_SECS: i32 = 43_200;

/// Assumed role lifetime when `--duration` is not given (1 hour)
pub const DEFAULT_ASSUME_ROLE_DURATION_SECS: i32 = 3_600;

/// Prefix of generated role session names
pub const ROLE_SESSION_NAME_PREFIX: &str = "mfaws";

/// Get the AWS credentials file path
/// Respects AWS_SHARED_CREDENTIALS_FILE environment variable if set
pub fn get_aws_credentials_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| {
        home.join(AWS_CONFIG_DIR_NAME)
            .join(AWS_CREDENTIALS_FILE_NAME)
    })
}
