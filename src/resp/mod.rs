/**
 * RESP - Redis Serialisation Protocol
 * https://redis.io/docs/reference/protocol-spec/
 */

pub mod command;
pub mod decoder;
pub mod reply;
pub mod router;
