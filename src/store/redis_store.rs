//! RedisStore - Key-value store backed by a Redis server.
//!
//! Transactions map onto `WATCH` + `MULTI`/`EXEC`. A nil `EXEC` reply means
//! a watched key changed and is reported as [`StoreError::Conflict`]; the
//! batch is not retried.

use r2d2::{Pool, PooledConnection};
use redis::{Client, Commands, Connection, RedisError};
use tracing::{debug, info, warn};

use super::{FieldMap, KeyValueStore, Op, StoreError, Transaction};
use crate::config::RedisConfig;

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Redis-backed store over a connection pool.
///
/// Every operation checks a connection out of the pool. `WATCH` state lives
/// on a connection, so a transaction keeps one connection from watch to exec
/// and leaves it unwatched when it goes back.
///
/// A `WRONGTYPE` failure inside `EXEC` is reported as
/// [`StoreError::WrongType`] for the first queued key holding the wrong kind
/// of value. Redis has still applied the batch's other commands by then.
#[derive(Debug, Clone)]
pub struct RedisStore {
    pool: Pool<Client>,
}

impl RedisStore {
    /// Build the pool from configuration and verify the server answers.
    pub fn connect(config: &RedisConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.connection_url())?;
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connect_timeout())
            .build(client)?;
        let store = Self { pool };

        let mut conn = store.connection()?;
        redis::cmd("PING").query::<String>(&mut *conn)?;
        info!(
            addr = %config.addr,
            db = config.database,
            pool_size = config.pool_size,
            "connected to redis"
        );

        Ok(store)
    }

    fn connection(&self) -> Result<PooledConnection<Client>, StoreError> {
        Ok(self.pool.get()?)
    }

    fn wrong_type(key: &str, err: RedisError) -> StoreError {
        if err.code() == Some("WRONGTYPE") {
            StoreError::WrongType { key: key.to_string() }
        } else {
            err.into()
        }
    }
}

fn field_pairs(fields: &FieldMap) -> Vec<(&str, &str)> {
    fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

fn queue(pipe: &mut redis::Pipeline, op: &Op) {
    match op {
        Op::Delete { key } => {
            pipe.del(key.as_str()).ignore();
        }
        Op::HashSet { key, fields } => {
            let pairs = field_pairs(fields);
            if !pairs.is_empty() {
                pipe.hset_multiple(key.as_str(), pairs.as_slice()).ignore();
            }
        }
        Op::SetAdd { key, member } => {
            pipe.sadd(key.as_str(), member.as_str()).ignore();
        }
        Op::SetRemove { key, member } => {
            pipe.srem(key.as_str(), member.as_str()).ignore();
        }
    }
}

/// Redis type an op needs its key to hold, if it cares.
fn required_type(op: &Op) -> Option<&'static str> {
    match op {
        Op::Delete { .. } => None,
        Op::HashSet { .. } => Some("hash"),
        Op::SetAdd { .. } | Op::SetRemove { .. } => Some("set"),
    }
}

/// First op whose key holds a value of another type, as told by `type_of`.
fn first_mismatch<F>(ops: &[Op], mut type_of: F) -> Result<Option<String>, RedisError>
where
    F: FnMut(&str) -> Result<String, RedisError>,
{
    for op in ops {
        let Some(required) = required_type(op) else {
            continue;
        };
        let actual = type_of(op.key())?;
        if actual != "none" && actual != required {
            return Ok(Some(op.key().to_string()));
        }
    }
    Ok(None)
}

fn exec_error(conn: &mut Connection, ops: &[Op], err: RedisError) -> StoreError {
    if err.code() != Some("WRONGTYPE") {
        return err.into();
    }
    let mismatch = first_mismatch(ops, |key| redis::cmd("TYPE").arg(key).query(&mut *conn));
    match mismatch {
        Ok(Some(key)) => StoreError::WrongType { key },
        _ => err.into(),
    }
}

/// Drop the connection's watch so it goes back to the pool clean.
fn unwatch(conn: &mut Connection) {
    if let Err(err) = redis::cmd("UNWATCH").query::<()>(conn) {
        warn!(error = %err, "failed to clear watched keys");
    }
}

impl KeyValueStore for RedisStore {
    fn watch<F>(&self, keys: &[&str], body: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Transaction) -> Result<(), StoreError>,
    {
        let mut conn = self.connection()?;
        redis::cmd("WATCH").arg(keys).query::<()>(&mut *conn)?;

        let mut tx = Transaction::new();
        if let Err(err) = body(&mut tx) {
            unwatch(&mut conn);
            return Err(err);
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in tx.ops() {
            queue(&mut pipe, op);
        }

        // EXEC ends the watch whatever its outcome.
        let reply: Option<redis::Value> = pipe
            .query(&mut *conn)
            .map_err(|err| exec_error(&mut conn, tx.ops(), err))?;
        match reply {
            Some(_) => Ok(()),
            None => {
                debug!(?keys, "transaction aborted by concurrent write");
                Err(StoreError::Conflict {
                    keys: keys.iter().map(|key| key.to_string()).collect(),
                })
            }
        }
    }

    fn hash_get_all(&self, key: &str) -> Result<FieldMap, StoreError> {
        let mut conn = self.connection()?;
        let fields: FieldMap = conn
            .hgetall(key)
            .map_err(|err| Self::wrong_type(key, err))?;

        // Redis never keeps an empty hash, so no fields means no key.
        if fields.is_empty() {
            return Err(StoreError::NotFound { key: key.to_string() });
        }
        Ok(fields)
    }

    fn hash_set(&self, key: &str, fields: &FieldMap) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let pairs = field_pairs(fields);
        let mut conn = self.connection()?;
        conn.hset_multiple::<_, _, _, ()>(key, pairs.as_slice())
            .map_err(|err| Self::wrong_type(key, err))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        let removed: i64 = conn.del(key)?;
        if removed == 0 {
            return Err(StoreError::NotFound { key: key.to_string() });
        }
        Ok(())
    }

    fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let added: i64 = conn
            .sadd(key, member)
            .map_err(|err| Self::wrong_type(key, err))?;
        Ok(added > 0)
    }

    fn set_remove(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let removed: i64 = conn
            .srem(key, member)
            .map_err(|err| Self::wrong_type(key, err))?;
        Ok(removed > 0)
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection()?;
        conn.smembers(key).map_err(|err| Self::wrong_type(key, err))
    }
}
