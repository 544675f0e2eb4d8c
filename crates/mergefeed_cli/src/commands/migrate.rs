//! Database migration commands.

use mergefeed::migration::{Migrator, MigratorTrait};

use crate::commands::shared::CommandResult;
use crate::config::Config;

pub enum Direction {
    Up,
    Down,
    Status,
    Fresh,
}

pub async fn run(direction: Direction) -> CommandResult {
    let config = Config::load()?;
    let db = mergefeed::connect(&config.database_url()).await?;

    match direction {
        Direction::Up => {
            Migrator::up(&db, None).await?;
            println!("migrations applied");
        }
        Direction::Down => {
            Migrator::down(&db, Some(1)).await?;
            println!("rolled back one migration");
        }
        Direction::Status => {
            Migrator::status(&db).await?;
        }
        Direction::Fresh => {
            Migrator::fresh(&db).await?;
            println!("database recreated from scratch");
        }
    }

    Ok(())
}
