use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::database::DatabaseManager;

#[derive(sqlx::FromRow)]
struct TokenSubject {
    id_user: i32,
    name: String,
    email: String,
}

/// Issue a session token for an active user, looked up by email
pub async fn mint(email: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    let pool = DatabaseManager::connect(config).await?;

    let subject = sqlx::query_as::<_, TokenSubject>(
        "SELECT id_user, name, email FROM users WHERE lower(email) = lower($1) AND active",
    )
    .bind(email.trim())
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| anyhow::anyhow!("No active user with email {}", email))?;

    let token = generate_jwt(&Claims::new(subject.id_user, subject.name.clone(), subject.email.clone()))?;
    tracing::info!("Issued session token for user {}", subject.id_user);

    match output_format {
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
        OutputFormat::Json => output_success(
            &output_format,
            "Token issued",
            Some(json!({
                "token": token,
                "id_user": subject.id_user,
                "name": subject.name,
                "expires_in_hours": config.security.jwt_expiry_hours,
            })),
        ),
    }
}
