use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub case_management: CaseManagementDefaults,
    pub files: FileConfig,
    pub max_body_size: usize,
    pub http_timeout_secs: u64,
    pub log_level: String,
}

/// Module-wide endpoint used when neither a handler override nor a
/// contact management group supplies a value.
#[derive(Debug, Clone, Default)]
pub struct CaseManagementDefaults {
    pub post_url: String,
    pub auth_header: String,
}

#[derive(Debug, Clone)]
pub struct FileConfig {
    pub private_dir: PathBuf,
    pub public_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub retrieval_folder: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("CASEBRIDGE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CASEBRIDGE_HOST: {e}"))?;

        let port: u16 = env_or("CASEBRIDGE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid CASEBRIDGE_PORT: {e}"))?;

        let base_url = env_or("CASEBRIDGE_BASE_URL", &format!("http://{host}:{port}"));

        let case_management = CaseManagementDefaults {
            post_url: env_or("CASEBRIDGE_POST_URL", ""),
            auth_header: env_or("CASEBRIDGE_AUTH_HEADER", ""),
        };

        let retrieval_folder = env_or(
            "CASEBRIDGE_RETRIEVAL_FOLDER",
            "private://casemanagement/covid-business-grants",
        );
        if !retrieval_folder.starts_with("private://") && !retrieval_folder.starts_with("public://")
        {
            return Err(
                "CASEBRIDGE_RETRIEVAL_FOLDER must begin with private:// or public://".to_string(),
            );
        }

        let files = FileConfig {
            private_dir: PathBuf::from(env_or("CASEBRIDGE_PRIVATE_DIR", "./files/private")),
            public_dir: PathBuf::from(env_or("CASEBRIDGE_PUBLIC_DIR", "./files/public")),
            temp_dir: std::env::var("CASEBRIDGE_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            retrieval_folder: retrieval_folder.trim_end_matches('/').to_string(),
        };

        let max_body_size: usize = env_or("CASEBRIDGE_MAX_BODY_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid CASEBRIDGE_MAX_BODY_SIZE: {e}"))?;

        let http_timeout_secs: u64 = env_or("CASEBRIDGE_HTTP_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid CASEBRIDGE_HTTP_TIMEOUT_SECS: {e}"))?;

        let log_level = env_or("CASEBRIDGE_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            case_management,
            files,
            max_body_size,
            http_timeout_secs,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
