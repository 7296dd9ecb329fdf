use super::{
    store::{Error, Result, UserStore},
    user::{Id, NewUser, User},
};
use log::{debug, info, trace};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Result as SqlResult, Row};

pub struct Database {
    conn: Connection,
}

/// Build the database.
impl Database {
    pub fn open(path: &str) -> SqlResult<Database> {
        if path == ":memory:" {
            return Database::in_memory();
        }

        let conn = Connection::open(path)?;
        trace!("Opened database connection to {}.", path);
        Database::init_db(conn)
    }

    pub fn in_memory() -> SqlResult<Database> {
        let conn = Connection::open_in_memory()?;
        trace!("Opened in-memory database connection.");
        Database::init_db(conn)
    }

    fn init_db(conn: Connection) -> SqlResult<Database> {
        trace!("Initializing database...");

        // AUTOINCREMENT so ids of deleted users are never handed out again
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                token    TEXT NOT NULL
            )",
            (),
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS users_token ON users (token)",
            (),
        )?;

        info!("Finished initializing database");

        Ok(Database { conn })
    }
}

/// User stuff
impl UserStore for Database {
    fn find_by_token(&self, token: &str) -> Result<Option<User>> {
        // Don't put the whole token in the logs
        trace!("Getting user by token {}...", token.get(..4).unwrap_or(""));
        let user = self
            .conn
            .query_row("SELECT * FROM users WHERE token=?1", (token,), map_user)
            .optional()?;
        Ok(user)
    }

    fn find_by_id(&self, id: Id) -> Result<Option<User>> {
        debug!("Getting user {}", id);
        let user = self
            .conn
            .query_row("SELECT * FROM users WHERE id=?1", (id,), map_user)
            .optional()?;
        Ok(user)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        debug!("Getting user (username: {})", username);
        let user = self
            .conn
            .query_row(
                "SELECT * FROM users WHERE username=?1",
                (username,),
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    fn insert(&self, user: NewUser) -> Result<Id> {
        debug!("Adding user {} to database", user.username);
        self.conn.execute(
            "INSERT INTO users (username, password, token) VALUES (?1, ?2, ?3)",
            (&user.username, &user.password_hash, &user.token),
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Added user {} to database", id);
        Ok(id)
    }

    fn update(&self, user: &User) -> Result<()> {
        debug!("Updating user {}", user.id);
        let changed = self.conn.execute(
            "UPDATE users SET username=?1, password=?2 WHERE id=?3",
            (&user.username, &user.password_hash, user.id),
        )?;
        if changed == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete(&self, id: Id) -> Result<()> {
        debug!("Deleting user {}", id);
        let changed = self.conn.execute("DELETE FROM users WHERE id=?1", (id,))?;
        if changed == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}

fn map_user(row: &Row) -> SqlResult<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password")?,
        token: row.get("token")?,
    })
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, _)
                if failure.code == ErrorCode::ConstraintViolation
                    && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::ConstraintViolation { field: "username" }
            }
            err => Error::Sqlite(err),
        }
    }
}
