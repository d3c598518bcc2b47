use log::{error, info, warn};
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};
use rocket::fairing::AdHoc;

use crate::models::{Review, User};

pub mod batch;

pub fn init() -> AdHoc {
    AdHoc::on_ignite("MongoDB", |rocket| async {
        match connect().await {
            Ok(database) => {
                info!("✓ MongoDB connected successfully");
                if let Err(e) = ensure_indexes(&database).await {
                    warn!("Failed to create indexes: {}", e);
                }
                rocket.manage(database)
            }
            Err(e) => {
                error!("✗ Failed to connect to MongoDB: {}", e);
                rocket
            }
        }
    })
}

async fn connect() -> Result<Database, mongodb::error::Error> {
    let uri = crate::config::Config::mongodb_uri();
    let client = Client::with_uri_str(&uri).await?;

    // Test connection
    client
        .database("admin")
        .run_command(doc! {"ping": 1}, None)
        .await?;

    Ok(client.database("majstr"))
}

/// Uniqueness the handlers rely on: one account per email, one review per
/// order. The pre-insert checks in the routes are advisory; these indexes
/// are the authority.
async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let unique = IndexOptions::builder().unique(true).build();

    db.collection::<User>("users")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique.clone())
                .build(),
            None,
        )
        .await?;

    db.collection::<Review>("reviews")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "order_id": 1 })
                .options(unique)
                .build(),
            None,
        )
        .await?;

    Ok(())
}

/// True for the server-side unique-index violation (code 11000), which the
/// insert paths translate into the same response as their advisory
/// pre-checks.
pub fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        _ => false,
    }
}

pub type DbConn = Database;

