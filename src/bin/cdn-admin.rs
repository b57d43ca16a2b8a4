/*
 * Responsibility
 * - Operator tasks against the configured database: migrate, seed, add users
 * - Mint an access token for an existing user (local testing)
 * - Reads the same environment as the API server
 */
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use uuid::Uuid;

use cdn_api::{
    app,
    config::Config,
    repos::{
        home_repo::{self, Address, HomeType, NewHome},
        product_repo::{self, NewProduct},
        user_repo::{self, NewUser, UserRow},
    },
    services::auth::{AuthService, Role, TokenSettings, password::hash_password},
};

const SEED_PASSWORD: &str = "gophers";

/// Administrative commands for the cdn-api database.
#[derive(Parser, Debug)]
#[command(name = "cdn-admin", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations
    Migrate,
    /// Insert sample users, a product and a home
    Seed,
    /// Migrate, then seed
    MigrateSeed,
    /// Add a user with the admin and user roles
    Useradd {
        name: String,
        email: String,
        password: String,
    },
    /// Print a signed access token for an existing user
    Token {
        user_id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    app::init_tracing();
    let args = Args::parse();
    let config = Config::from_env()?;

    match args.command {
        Command::Migrate => {
            let db = app::connect(&config).await?;
            app::migrate(&db).await?;
            println!("migrations complete");
        }
        Command::Seed => {
            let db = app::connect(&config).await?;
            seed(&db).await?;
            println!("seed data complete");
        }
        Command::MigrateSeed => {
            let db = app::connect(&config).await?;
            app::migrate(&db).await?;
            seed(&db).await?;
            println!("migrations and seed data complete");
        }
        Command::Useradd {
            name,
            email,
            password,
        } => {
            let db = app::connect(&config).await?;
            let user = add_user(&db, &name, &email, &password, &[Role::Admin, Role::User]).await?;
            println!("user id: {}", user.id);
        }
        Command::Token { user_id } => {
            let db = app::connect(&config).await?;
            let user = user_repo::get(&db, user_id)
                .await?
                .with_context(|| format!("user {user_id} not found"))?;

            let auth = AuthService::new(&TokenSettings::from(&config))?;
            if !auth.can_sign() {
                bail!("ACCESS_JWT_PRIVATE_KEY_PEM is required to issue tokens");
            }
            let roles: Vec<Role> = user.roles.iter().filter_map(|r| Role::parse(r)).collect();
            println!("{}", auth.issue(user.id, &roles)?);
        }
    }

    Ok(())
}

async fn add_user(
    db: &PgPool,
    name: &str,
    email: &str,
    password: &str,
    roles: &[Role],
) -> Result<UserRow> {
    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let new = NewUser {
        name: name.to_string(),
        email: email.to_string(),
        roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        password_hash,
        department: None,
    };
    user_repo::create(db, &new)
        .await
        .with_context(|| format!("create user {email}"))
}

/// Existing seed users are reused, so running it twice adds only
/// another product and home.
async fn seed(db: &PgPool) -> Result<()> {
    let admin = match user_repo::get_by_email(db, "admin@example.com").await? {
        Some(user) => user,
        None => {
            add_user(
                db,
                "Admin Gopher",
                "admin@example.com",
                SEED_PASSWORD,
                &[Role::Admin, Role::User],
            )
            .await?
        }
    };
    let user = match user_repo::get_by_email(db, "user@example.com").await? {
        Some(user) => user,
        None => add_user(db, "User Gopher", "user@example.com", SEED_PASSWORD, &[Role::User]).await?,
    };

    let product = product_repo::create(
        db,
        &NewProduct {
            user_id: user.id,
            name: "Comic Books".to_string(),
            cost: 50.0,
            quantity: 42,
        },
    )
    .await?;

    let home = home_repo::create(
        db,
        &NewHome {
            user_id: user.id,
            home_type: HomeType::Single,
            address: Address {
                address1: "123 Mockingbird Lane".to_string(),
                address2: String::new(),
                zip_code: "35810".to_string(),
                city: "Huntsville".to_string(),
                state: "AL".to_string(),
                country: "USA".to_string(),
            },
        },
    )
    .await?;

    tracing::info!(
        admin = %admin.id,
        user = %user.id,
        product = %product.id,
        home = %home.id,
        "seeded"
    );
    Ok(())
}
