//! colorm demo binary.
//!
//! Declares a `users` table, renders its DDL and runs the create / uniqueness
//! / validation / update flow against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colorm::catalog::ddl;
use colorm::{record, ClientConfig, Error, Mapper, MemoryStore, Record, Schema, Session};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "colorm-demo")]
#[command(about = "Walk through colorm against an in-memory store")]
struct Args {
    /// Number of users to create.
    #[arg(short, long, default_value_t = 3)]
    users: usize,

    /// Keyspace the table lives in.
    #[arg(short, long, default_value = "demo")]
    keyspace: String,

    /// Per-statement timeout (ms).
    #[arg(long, default_value_t = 5_000)]
    timeout_ms: u64,
}

fn users_schema(keyspace: &str) -> Result<Schema, Error> {
    let mut def = json!({
        "fields": {
            "id": "uuid",
            "email": {
                "type": "text",
                "unique": true,
                "validate": {"required": true, "isEmail": true}
            },
            "name": {"type": "text", "validate": {"required": true, "minLength": 2}},
            "age": {"type": "int", "validate": {"min": 0, "max": 150}},
            "tags": "set<text>",
            "plan": {"type": "text", "default": "free"}
        },
        "key": ["id"]
    });
    def["keyspace"] = json!(keyspace);
    Schema::from_json("users", def)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let schema = users_schema(&args.keyspace)?;

    info!(table = %schema.qualified_name(), "Declared schema");
    println!("{}", ddl::create_table(&schema));
    for stmt in ddl::create_indexes(&schema) {
        println!("{}", stmt);
    }

    let store = Arc::new(MemoryStore::new());
    store.define_table(
        &schema.qualified_name(),
        schema.key().to_vec(),
        schema.clustering().to_vec(),
        Vec::<String>::new(),
    );

    let config = ClientConfig::new()
        .with_keyspace(args.keyspace.clone())
        .with_timeout(Duration::from_millis(args.timeout_ms));
    let session = Session::connect(store.clone(), config).await?;
    let users = Mapper::new(Arc::new(session)).model(schema);

    let mut first_id = None;
    for i in 0..args.users {
        let user = users
            .create(record! {
                "email" => format!("user{}@example.com", i),
                "name" => format!("User {}", i),
                "age" => format!("{}", 20 + i),
            })
            .await?;
        info!(id = ?user.get("id"), plan = ?user.get("plan"), "Created user");
        first_id = first_id.or_else(|| user.get("id").cloned());
    }

    match users
        .create(record! { "email" => "user0@example.com", "name" => "Copycat" })
        .await
    {
        Err(err) if err.is_unique_violation() => warn!(%err, "Duplicate rejected"),
        other => anyhow::bail!("expected a uniqueness violation, got {:?}", other),
    }

    let violations = users.validate(&record! { "email" => "nope", "name" => "J" }, false);
    for violation in &violations {
        warn!(%violation, "Validation");
    }

    if let Some(id) = first_id {
        let mut filter = Record::new();
        filter.insert("id".to_string(), id);
        users
            .update(record! { "email" => "user0@example.com", "age" => 42i32 }, filter.clone())
            .await?;
        let row = users.find_one(filter).await?;
        info!(row = ?row.map(|r| r.to_json()), "Updated user");
    }

    let total = users.count(Record::new()).await?;
    info!(total, statements = store.statements().len(), "Done");

    Ok(())
}
