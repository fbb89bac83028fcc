use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

const PING_USAGE: &str = "PING [message]";
const ECHO_USAGE: &str = "ECHO message";
const GET_USAGE: &str = "GET key";
const SET_USAGE: &str = "SET key value [PX milliseconds]";

/**
 * Redis CLI commands
 */
pub enum CommandName {
    PING,
    ECHO,
    GET,
    SET,
    UNDEFINED
}

impl From<&Bytes> for CommandName {
    fn from(command: &Bytes) -> Self {
        match command.to_ascii_uppercase().as_slice() {
            b"PING" => Self::PING,
            b"ECHO" => Self::ECHO,
            b"GET" => Self::GET,
            b"SET" => Self::SET,
            _ => Self::UNDEFINED
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("wrong arguments, usage: {usage}")]
    Validation { usage: &'static str },
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

/**
 * A request whose arguments have been checked against its command's shape
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedisCommand {
    Ping(Option<Bytes>),
    Echo(Bytes),
    Get(Bytes),
    Set {
        key: Bytes,
        value: Bytes,
        ttl: Option<Duration>,
    },
}

impl TryFrom<&[Bytes]> for RedisCommand {
    type Error = CommandError;

    fn try_from(request: &[Bytes]) -> Result<Self, Self::Error> {
        let (command, args) = request
            .split_first()
            .ok_or_else(|| CommandError::UnknownCommand(String::new()))?;

        match CommandName::from(command) {
            CommandName::PING => match args {
                [] => Ok(Self::Ping(None)),
                [message] => Ok(Self::Ping(Some(message.clone()))),
                _ => Err(CommandError::Validation { usage: PING_USAGE }),
            },
            CommandName::ECHO => match args {
                [message] => Ok(Self::Echo(message.clone())),
                _ => Err(CommandError::Validation { usage: ECHO_USAGE }),
            },
            CommandName::GET => match args {
                [key] => Ok(Self::Get(key.clone())),
                _ => Err(CommandError::Validation { usage: GET_USAGE }),
            },
            CommandName::SET => match args {
                [key, value] => Ok(Self::Set { key: key.clone(), value: value.clone(), ttl: None }),
                [key, value, modifier, millis] if modifier.eq_ignore_ascii_case(b"PX") => {
                    Ok(Self::Set {
                        key: key.clone(),
                        value: value.clone(),
                        ttl: Some(Duration::from_millis(parse_millis(millis)?)),
                    })
                },
                _ => Err(CommandError::Validation { usage: SET_USAGE }),
            },
            CommandName::UNDEFINED => Err(CommandError::UnknownCommand(
                String::from_utf8_lossy(command).into_owned()
            )),
        }
    }
}

/**
 * Plain non-negative decimal, no sign
 */
fn parse_millis(digits: &[u8]) -> Result<u64, CommandError> {
    let invalid = || CommandError::Validation { usage: SET_USAGE };

    if digits.is_empty() {
        return Err(invalid());
    }

    digits.iter().try_fold(0u64, |millis, digit| match digit {
        b'0'..=b'9' => millis
            .checked_mul(10)
            .and_then(|millis| millis.checked_add(u64::from(digit - b'0')))
            .ok_or_else(invalid),
        _ => Err(invalid()),
    })
}
