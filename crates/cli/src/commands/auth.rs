//! `mp-cli auth` - account and session.

use std::io::Write;

use clap::{Args, Subcommand};
use secrecy::SecretString;
use serde_json::{Map, Value};

use marketplus_core::{Email, Role};
use marketplus_storefront::Storefront;
use marketplus_storefront::models::{Registration, SessionUser};
use marketplus_storefront::services::{AuthApi, AuthError};

use crate::error::CliError;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Log in and remember the user
    Login {
        /// Email address or username
        #[arg(short, long, visible_alias = "username")]
        email: String,
        #[arg(short, long, env = "MARKETPLUS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register(RegisterArgs),
    /// Forget the logged-in user
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Edit the locally cached profile
    Profile {
        /// Field assignment `key=value`; JSON values are decoded
        #[arg(long = "set", value_name = "KEY=VALUE", required = true)]
        fields: Vec<String>,
    },
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(short, long)]
    email: String,
    #[arg(short, long, env = "MARKETPLUS_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    /// `BUYER` or `SELLER`
    #[arg(long, default_value_t = Role::Buyer)]
    role: Role,
    /// Store name (sellers)
    #[arg(long)]
    business_name: Option<String>,
}

/// Run an `auth` subcommand.
///
/// # Errors
///
/// Returns an error if the auth API rejects the request or is unreachable,
/// or if the session slot cannot be read or written.
pub async fn run<A: AuthApi>(
    storefront: &Storefront<A>,
    action: AuthAction,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let session = storefront.session();
    match action {
        AuthAction::Login { email, password } => {
            let user = session
                .login(&email, &SecretString::from(password))
                .await
                .map_err(explain_rejection)?;
            writeln!(out, "Hoş geldiniz, {}!", user.display_name())?;
        }
        AuthAction::Register(args) => {
            let registration = Registration {
                email: Email::parse(&args.email).map_err(AuthError::from)?,
                password: SecretString::from(args.password),
                first_name: args.first_name,
                last_name: args.last_name,
                role: args.role,
                business_name: args.business_name,
                extra: Map::new(),
            };
            session
                .register(&registration)
                .await
                .map_err(explain_rejection)?;
            writeln!(out, "Kayıt başarılı. Şimdi giriş yapabilirsiniz.")?;
        }
        AuthAction::Logout => {
            session.logout().await?;
            writeln!(out, "Çıkış yapıldı.")?;
        }
        AuthAction::Whoami => match session.current_user()? {
            Some(user) => print_user(out, &user)?,
            None => writeln!(out, "Giriş yapılmadı.")?,
        },
        AuthAction::Profile { fields } => {
            let mut patch = Map::new();
            for field in fields {
                let (key, value) = parse_assignment(&field)?;
                patch.insert(key, value);
            }
            let user = session.update_profile(patch)?;
            print_user(out, &user)?;
        }
    }
    Ok(())
}

fn print_user(out: &mut impl Write, user: &SessionUser) -> Result<(), CliError> {
    writeln!(out, "[{}] {}", user.initials(), user.display_name())?;
    writeln!(out, "{}", user.email)?;
    writeln!(out, "{}", user.account_label())?;
    Ok(())
}

/// Log the server's field errors before the rejection bubbles up.
fn explain_rejection(err: AuthError) -> AuthError {
    if let Some(Value::Object(fields)) = err.rejection() {
        for (field, messages) in fields {
            tracing::warn!(field = %field, messages = %messages, "Rejected by auth API");
        }
    }
    err
}

/// Split `key=value`, decoding the value as JSON when possible.
fn parse_assignment(field: &str) -> Result<(String, Value), CliError> {
    let (key, raw) = field
        .split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .ok_or_else(|| CliError::InvalidAssignment(field.to_string()))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.trim().to_string(), value))
}
