use std::{
    fmt,
    path::PathBuf,
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum Request {
    Run(Job),
    Stop,
}

/// Where the history lives.
#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

impl Location {
    fn open(&self) -> Result<Connection> {
        let conn = match self {
            Location::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create history directory {}", parent.display())
                    })?;
                }
                Connection::open(path)
            }
            Location::Memory => Connection::open_in_memory(),
        };
        conn.with_context(|| format!("failed to open history store at {self}"))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File(path) => write!(f, "{}", path.display()),
            Location::Memory => f.write_str("<memory>"),
        }
    }
}

/// Owns the writer thread; stopping it on drop flushes every queued job.
struct Writer {
    requests: mpsc::Sender<Request>,
    handle: Option<JoinHandle<()>>,
}

impl Drop for Writer {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if self.requests.send(Request::Stop).is_err() {
            warn!("History writer already gone at shutdown");
        }
        if let Err(err) = handle.join() {
            error!("History writer panicked: {err:?}");
        }
    }
}

/// History store. One writer thread owns the SQLite connection; callers hand
/// it closures and await the reply.
#[derive(Clone)]
pub struct Database {
    writer: Arc<Writer>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        Self::start(Location::File(db_path))
    }

    /// Private database that lives as long as the handle; used by tests and
    /// replay runs without a configured path.
    pub fn in_memory() -> Result<Self> {
        Self::start(Location::Memory)
    }

    fn start(location: Location) -> Result<Self> {
        let (requests, inbox) = mpsc::channel::<Request>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let thread_location = location.clone();
        let handle = thread::Builder::new()
            .name("healthguard-history".into())
            .spawn(move || {
                let mut conn = match prepare(&thread_location) {
                    Ok(conn) => conn,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                if ready_tx.send(Ok(())).is_err() {
                    return;
                }
                serve(&mut conn, inbox);
            })
            .context("failed to spawn history writer thread")?;

        ready_rx
            .recv()
            .context("history writer exited before reporting readiness")??;

        info!("History database ready at {location}");

        Ok(Self {
            writer: Arc::new(Writer {
                requests,
                handle: Some(handle),
            }),
        })
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let job: Job = Box::new(move |conn| {
            // The caller may have given up waiting; the write still happened.
            let _ = reply_tx.send(task(conn));
        });

        self.writer
            .requests
            .send(Request::Run(job))
            .map_err(|_| anyhow!("history writer is no longer running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("history writer stopped before replying"))?
    }
}

/// Opens the store and brings its schema up to date.
fn prepare(location: &Location) -> Result<Connection> {
    let mut conn = location.open()?;

    if let Location::File(_) = location {
        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            warn!("Could not enable WAL mode: {err}");
        }
    }
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;

    run_migrations(&mut conn).context("failed to migrate history schema")?;
    Ok(conn)
}

fn serve(conn: &mut Connection, inbox: mpsc::Receiver<Request>) {
    for request in inbox {
        match request {
            Request::Run(job) => job(conn),
            Request::Stop => break,
        }
    }
    info!("History writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn jobs_run_in_submission_order() {
        let db = Database::in_memory().unwrap();
        db.execute(|conn| {
            conn.execute_batch("CREATE TABLE seen (n INTEGER NOT NULL)")?;
            Ok(())
        })
        .await
        .unwrap();

        for n in 0..5 {
            db.execute(move |conn| {
                conn.execute("INSERT INTO seen (n) VALUES (?1)", [n])?;
                Ok(())
            })
            .await
            .unwrap();
        }

        let seen: Vec<i64> = db
            .execute(|conn| {
                let mut stmt = conn.prepare("SELECT n FROM seen ORDER BY rowid")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                Ok(rows.collect::<rusqlite::Result<Vec<i64>>>()?)
            })
            .await
            .unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn task_errors_reach_the_caller() {
        let db = Database::in_memory().unwrap();
        let result: Result<()> = db
            .execute(|conn| {
                conn.execute_batch("SELECT * FROM no_such_table")?;
                Ok(())
            })
            .await;
        assert!(result.is_err());

        // The writer keeps serving after a failed job.
        let one: i64 = db
            .execute(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn unopenable_path_fails_at_startup() {
        let blocker = std::env::temp_dir().join(format!(
            "healthguard-blocker-{}",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = Database::new(blocker.join("history.sqlite3"));
        assert!(result.is_err());

        let _ = std::fs::remove_file(&blocker);
    }
}
