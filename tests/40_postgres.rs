use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use sqlx::{Connection, Executor, PgConnection};

use registros_gateway::database::{
    Cell, CredentialStore, PgCredentialStore, ProcedureCall, RawResult, StoreError,
};
use registros_gateway::validation::{LoginCredentials, UserRecord};

const FIXTURE: &str = include_str!("fixtures/procedures.sql");
const RECORD_ID: i64 = 9001;

fn database_url() -> Option<String> {
    let _ = dotenvy::dotenv();
    std::env::var("DATABASE_URL").ok()
}

async fn install_fixture(conn: &mut PgConnection) -> Result<()> {
    for statement in FIXTURE.split("\n-- next\n") {
        conn.execute(statement).await.context("failed to install fixture")?;
    }
    Ok(())
}

/// Other backends attached to this database.
async fn sessions(conn: &mut PgConnection) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT count(*) FROM pg_stat_activity \
         WHERE datname = current_database() AND pid <> pg_backend_pid()",
    )
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

async fn wait_for_sessions(conn: &mut PgConnection, baseline: i64) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let now = sessions(conn).await?;
        if now <= baseline {
            return Ok(());
        }
        if Instant::now() > deadline {
            bail!("{} connections still open, expected at most {}", now, baseline);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

fn record(nombre: &str) -> UserRecord {
    UserRecord {
        id: RECORD_ID,
        first_name: nombre.to_string(),
        last_name: "Ruiz".to_string(),
        email: "ana.pg@example.com".to_string(),
        password: "abc12345".to_string(),
    }
}

fn login(password: &str) -> ProcedureCall {
    ProcedureCall::login(&LoginCredentials {
        email: "ana.pg@example.com".to_string(),
        password: password.to_string(),
    })
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a disposable PostgreSQL database"]
async fn stored_procedures_round_trip() -> Result<()> {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };

    let mut admin = PgConnection::connect(&url).await?;
    install_fixture(&mut admin).await?;
    let baseline = sessions(&mut admin).await?;

    let store = PgCredentialStore::new(&url)?;
    store.ping().await?;

    store.call(ProcedureCall::delete(RECORD_ID)).await?;
    assert_eq!(store.call(ProcedureCall::create(&record("Ana"))).await?, RawResult::Committed);
    assert_eq!(store.call(ProcedureCall::update(&record("Anabel"))).await?, RawResult::Committed);

    let RawResult::Rows(rows) = store.call(ProcedureCall::list()).await? else {
        bail!("list returned no cursor");
    };
    let row = rows
        .iter()
        .find(|row| row.get("id") == Some(&Cell::Integer(RECORD_ID)))
        .context("inserted record missing from list")?;
    assert_eq!(row.get("nombre"), Some(&Cell::Text("Anabel".to_string())));

    // identifier comes back in the first column, not one named `id`
    let RawResult::Rows(rows) = store.call(login("abc12345")).await? else {
        bail!("login returned no cursor");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].first_value(), Some(&Cell::Integer(RECORD_ID)));

    let RawResult::Rows(rows) = store.call(login("wrongpass1")).await? else {
        bail!("login returned no cursor");
    };
    assert!(rows.is_empty());

    let err = store.call(login("explode1")).await.unwrap_err();
    assert!(
        matches!(err, StoreError::Procedure { procedure: "sp_login_user", .. }),
        "unexpected error: {:?}",
        err
    );

    // the store is still usable after a failed cursor call
    store.call(ProcedureCall::list()).await?;
    assert_eq!(store.call(ProcedureCall::delete(RECORD_ID)).await?, RawResult::Committed);

    wait_for_sessions(&mut admin, baseline).await?;
    Ok(())
}

#[tokio::test]
async fn unreachable_database_is_a_connect_error() -> Result<()> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let store = PgCredentialStore::new(&format!("postgres://nobody@127.0.0.1:{}/nothing", port))?;

    assert!(matches!(store.ping().await, Err(StoreError::Connect(_))));
    assert!(matches!(
        store.call(ProcedureCall::list()).await,
        Err(StoreError::Connect(_))
    ));
    Ok(())
}
