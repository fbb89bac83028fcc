use bytes::Bytes;
use tracing::debug;

use super::{
    command::{CommandError, RedisCommand},
    reply::Reply,
};
use crate::store::Store;

/**
 * Maps decoded requests onto store operations and builds their replies
 */
#[derive(Debug, Clone)]
pub struct CommandRouter {
    store: Store,
}

impl CommandRouter {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn dispatch(&self, request: &[Bytes]) -> Result<Reply, CommandError> {
        let command = RedisCommand::try_from(request)?;
        debug!(?command, "Dispatching");

        let reply = match command {
            RedisCommand::Ping(None) => Reply::Simple("PONG".to_owned()),
            RedisCommand::Ping(Some(message)) | RedisCommand::Echo(message) => Reply::Bulk(message),
            RedisCommand::Get(key) => self.store.get(&key).map_or(Reply::Null, Reply::Bulk),
            RedisCommand::Set { key, value, ttl } => {
                self.store.set(key, value, ttl);
                Reply::ok()
            },
        };

        Ok(reply)
    }
}
