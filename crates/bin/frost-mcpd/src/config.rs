use clap::{Parser, builder::BoolishValueParser};
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use frost_core::filter::ExclusionPatterns;
use frost_core::options::ServerOptions;
use frost_warehouse::{ConnectionParams, TokenType};
use serde::Deserialize;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_TOKEN_TYPE: &str = "oauth";

#[derive(Parser, Debug)]
#[command(name = "frost-mcpd", version, about = "Frost warehouse MCP daemon.")]
struct CliArgs {
    #[arg(long, env = "SNOWFLAKE_ACCOUNT")]
    account: Option<String>,

    #[arg(long, env = "SNOWFLAKE_USER")]
    user: Option<String>,

    #[arg(long, env = "SNOWFLAKE_TOKEN")]
    token: Option<String>,

    #[arg(long, env = "SNOWFLAKE_TOKEN_TYPE", default_value = DEFAULT_TOKEN_TYPE)]
    token_type: String,

    #[arg(long, env = "SNOWFLAKE_DATABASE")]
    database: Option<String>,

    #[arg(long, env = "SNOWFLAKE_SCHEMA")]
    schema: Option<String>,

    #[arg(long, env = "SNOWFLAKE_WAREHOUSE")]
    warehouse: Option<String>,

    #[arg(long, env = "SNOWFLAKE_ROLE")]
    role: Option<String>,

    #[arg(
        long = "allow-write",
        env = "FROST_ALLOW_WRITE",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    allow_write: bool,

    #[arg(
        long,
        env = "FROST_PREFETCH",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    prefetch: bool,

    #[arg(long = "no-prefetch", default_value_t = false)]
    no_prefetch: bool,

    #[arg(long = "exclude-tools", env = "FROST_EXCLUDE_TOOLS", value_delimiter = ',')]
    exclude_tools: Vec<String>,

    #[arg(
        long = "exclude-database",
        env = "FROST_EXCLUDE_DATABASES",
        value_delimiter = ','
    )]
    exclude_databases: Vec<String>,

    #[arg(
        long = "exclude-schema",
        env = "FROST_EXCLUDE_SCHEMAS",
        value_delimiter = ','
    )]
    exclude_schemas: Vec<String>,

    #[arg(
        long = "exclude-table",
        env = "FROST_EXCLUDE_TABLES",
        value_delimiter = ','
    )]
    exclude_tables: Vec<String>,

    #[arg(long = "connections-file", env = "SNOWFLAKE_CONNECTIONS_FILE")]
    connections_file: Option<PathBuf>,

    #[arg(long = "connection-name", env = "SNOWFLAKE_CONNECTION_NAME")]
    connection_name: Option<String>,

    #[arg(long = "log-level", env = "FROST_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    #[arg(long = "http-addr", env = "FROST_HTTP_ADDR")]
    http_addr: Option<SocketAddr>,
}

/// One named connection profile from the TOML connections file. Values here
/// override flags and environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConnectionProfile {
    account: Option<String>,
    user: Option<String>,
    token: Option<String>,
    token_type: Option<String>,
    database: Option<String>,
    schema: Option<String>,
    warehouse: Option<String>,
    role: Option<String>,
}

/// Runtime configuration resolved from CLI flags, environment variables, and
/// an optional TOML connection profile.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub connection: ConnectionParams,
    pub options: ServerOptions,
    pub log_level: String,
    pub http_addr: Option<SocketAddr>,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
    IncompleteProfile,
    Profile(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
            Self::IncompleteProfile => write!(
                f,
                "--connections-file and --connection-name must be provided together"
            ),
            Self::Profile(message) => write!(f, "connections file error: {message}"),
        }
    }
}

impl Error for ConfigError {}

impl DaemonConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        let profile = match (&args.connections_file, &args.connection_name) {
            (Some(path), Some(name)) => Some(load_connection_profile(path, name)?),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteProfile),
        };
        Self::resolve(args, profile)
    }

    fn resolve(args: CliArgs, profile: Option<ConnectionProfile>) -> Result<Self, ConfigError> {
        let profile = profile.unwrap_or_default();

        let account = profile
            .account
            .or(args.account)
            .ok_or(ConfigError::MissingSetting("SNOWFLAKE_ACCOUNT"))?;
        let user = profile
            .user
            .or(args.user)
            .ok_or(ConfigError::MissingSetting("SNOWFLAKE_USER"))?;
        let token = profile
            .token
            .or(args.token)
            .ok_or(ConfigError::MissingSetting("SNOWFLAKE_TOKEN"))?;
        let database = profile
            .database
            .or(args.database)
            .ok_or(ConfigError::MissingSetting("SNOWFLAKE_DATABASE"))?;
        let schema = profile
            .schema
            .or(args.schema)
            .ok_or(ConfigError::MissingSetting("SNOWFLAKE_SCHEMA"))?;

        let token_type_raw = profile.token_type.unwrap_or(args.token_type);
        let token_type =
            parse_token_type(&token_type_raw).ok_or_else(|| ConfigError::InvalidSetting {
                name: "SNOWFLAKE_TOKEN_TYPE",
                value: token_type_raw.clone(),
            })?;

        let connection = ConnectionParams {
            account,
            user,
            token,
            token_type,
            database,
            schema,
            warehouse: profile.warehouse.or(args.warehouse),
            role: profile.role.or(args.role),
        };

        let options = ServerOptions {
            allow_write: args.allow_write,
            prefetch: args.prefetch && !args.no_prefetch,
            exclude_tools: args.exclude_tools,
            exclusions: ExclusionPatterns {
                databases: args.exclude_databases,
                schemas: args.exclude_schemas,
                tables: args.exclude_tables,
            },
        };

        Ok(Self {
            connection,
            options,
            log_level: args.log_level,
            http_addr: args.http_addr,
        })
    }
}

fn parse_token_type(raw: &str) -> Option<TokenType> {
    match raw.to_ascii_lowercase().as_str() {
        "oauth" => Some(TokenType::OAuth),
        "pat" | "programmatic-access-token" => Some(TokenType::ProgrammaticAccessToken),
        "keypair-jwt" => Some(TokenType::KeyPairJwt),
        _ => None,
    }
}

fn load_connection_profile(path: &Path, name: &str) -> Result<ConnectionProfile, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| ConfigError::Profile(format!("cannot read {}: {err}", path.display())))?;
    profile_from_str(&text, name)
}

fn profile_from_str(text: &str, name: &str) -> Result<ConnectionProfile, ConfigError> {
    let table: toml::Table = text
        .parse()
        .map_err(|err| ConfigError::Profile(format!("invalid TOML: {err}")))?;
    let Some(section) = table.get(name) else {
        return Err(ConfigError::Profile(format!(
            "connection '{name}' not found"
        )));
    };
    section
        .clone()
        .try_into()
        .map_err(|err| ConfigError::Profile(format!("invalid connection '{name}': {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            account: Some("myorg-myaccount".to_string()),
            user: Some("analyst".to_string()),
            token: Some("secret".to_string()),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            database: Some("ANALYTICS".to_string()),
            schema: Some("PUBLIC".to_string()),
            warehouse: None,
            role: None,
            allow_write: false,
            prefetch: false,
            no_prefetch: false,
            exclude_tools: Vec::new(),
            exclude_databases: Vec::new(),
            exclude_schemas: Vec::new(),
            exclude_tables: Vec::new(),
            connections_file: None,
            connection_name: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            http_addr: None,
        }
    }

    #[test]
    fn resolves_connection_from_flags() {
        let config = DaemonConfig::resolve(base_args(), None).expect("config resolves");
        assert_eq!(config.connection.account, "myorg-myaccount");
        assert_eq!(config.connection.token_type, TokenType::OAuth);
        assert!(!config.options.allow_write);
    }

    #[test]
    fn missing_account_is_reported() {
        let mut args = base_args();
        args.account = None;
        let err = DaemonConfig::resolve(args, None).expect_err("missing account");
        assert!(matches!(err, ConfigError::MissingSetting("SNOWFLAKE_ACCOUNT")));
    }

    #[test]
    fn profile_values_override_flags() {
        let profile = ConnectionProfile {
            account: Some("other-account".to_string()),
            token_type: Some("pat".to_string()),
            ..ConnectionProfile::default()
        };
        let config =
            DaemonConfig::resolve(base_args(), Some(profile)).expect("config resolves");
        assert_eq!(config.connection.account, "other-account");
        assert_eq!(
            config.connection.token_type,
            TokenType::ProgrammaticAccessToken
        );
        assert_eq!(config.connection.user, "analyst");
    }

    #[test]
    fn invalid_token_type_is_rejected() {
        let mut args = base_args();
        args.token_type = "password".to_string();
        let err = DaemonConfig::resolve(args, None).expect_err("invalid token type");
        assert!(matches!(err, ConfigError::InvalidSetting { .. }));
    }

    #[test]
    fn exclusions_land_in_server_options() {
        let mut args = base_args();
        args.exclude_schemas = vec!["TEMP*".to_string()];
        args.exclude_tools = vec!["write_query".to_string()];
        args.prefetch = true;
        let config = DaemonConfig::resolve(args, None).expect("config resolves");
        assert_eq!(config.options.exclusions.schemas, vec!["TEMP*".to_string()]);
        assert_eq!(config.options.exclude_tools, vec!["write_query".to_string()]);
        assert!(config.options.prefetch);
    }

    #[test]
    fn no_prefetch_overrides_prefetch() {
        let mut args = base_args();
        args.prefetch = true;
        args.no_prefetch = true;
        let config = DaemonConfig::resolve(args, None).expect("config resolves");
        assert!(!config.options.prefetch);
    }

    #[test]
    fn profile_is_selected_by_name() {
        let text = r#"
[dev]
account = "dev-account"
token = "dev-token"

[prod]
account = "prod-account"
"#;
        let profile = profile_from_str(text, "dev").expect("profile parses");
        assert_eq!(profile.account.as_deref(), Some("dev-account"));
        assert_eq!(profile.token.as_deref(), Some("dev-token"));

        let err = profile_from_str(text, "staging").expect_err("unknown profile");
        assert!(matches!(err, ConfigError::Profile(_)));
    }
}
