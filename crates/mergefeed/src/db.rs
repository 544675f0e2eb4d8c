//! Database connection utilities.

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Apply SQLite pragmas suited to a read-heavy cache with concurrent writers.
///
/// - `journal_mode=WAL` so page reads don't block sync writes
/// - `busy_timeout=5000` to wait out lock contention instead of failing
/// - `synchronous=NORMAL`, safe under WAL
async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    use sea_orm::{ConnectionTrait, Statement};

    for pragma in [
        "PRAGMA journal_mode=WAL",
        "PRAGMA busy_timeout=5000",
        "PRAGMA synchronous=NORMAL",
        "PRAGMA foreign_keys=ON",
    ] {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            pragma.to_string(),
        ))
        .await?;
    }

    Ok(())
}

/// Establish a connection to the database.
///
/// SQLite connections are configured with WAL journaling, a 5 second busy
/// timeout, and enforced foreign keys (the child tables rely on cascade
/// deletes).
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    if database_url.starts_with("sqlite:") {
        configure_sqlite(&db).await?;
    }

    Ok(db)
}

/// Establish a connection and run all pending migrations.
///
/// This is the recommended way for applications to initialize the database;
/// it keeps the schema up-to-date on every start.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established or a migration
/// fails.
#[cfg(feature = "migrate")]
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    use sea_orm_migration::MigratorTrait;

    let db = connect(database_url).await?;
    crate::migration::Migrator::up(&db, None).await?;
    Ok(db)
}
