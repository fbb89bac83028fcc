use bytes::Bytes;
use thiserror::Error;

/**
 * Command name followed by its arguments, in wire order
 */
pub type Request = Vec<Bytes>;

const CRLF: &[u8] = b"\r\n";

// Upper bound on slots reserved up front for a declared array size
const MAX_PREALLOCATED_ARGS: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("incomplete frame")]
    Incomplete,
    #[error("expected '{expected}' but found {found:?}")]
    UnexpectedPrefix { expected: char, found: char },
    #[error("invalid byte {0:#04x} in length header")]
    InvalidLength(u8),
    #[error("length header overflows")]
    LengthOverflow,
    #[error("missing CRLF terminator")]
    MissingTerminator,
}

/**
 * Decodes client requests sent as a RESP array of bulk strings:
 * `*<N>\r\n` followed by N times `$<L>\r\n<L bytes>\r\n`
 *
 * Holds no state between calls, so a failed decode never affects the next one.
 */
pub struct RESPDecoder;

impl RESPDecoder {
    /**
     * Decodes the first request in `buf`.
     * Returns the request and the number of bytes it occupied.
     */
    pub fn decode(buf: &[u8]) -> Result<(Request, usize), ProtocolError> {
        let (array_size, mut cursor) = Self::parse_length(buf, 0, b'*')?;
        let mut request = Vec::with_capacity(array_size.min(MAX_PREALLOCATED_ARGS));

        for _ in 0..array_size {
            let (argument, consumed) = Self::parse_bulk_string(buf, cursor)?;
            request.push(argument);
            cursor += consumed;
        }

        Ok((request, cursor))
    }

    fn parse_bulk_string(buf: &[u8], start: usize) -> Result<(Bytes, usize), ProtocolError> {
        let (size, header) = Self::parse_length(buf, start, b'$')?;

        let payload_start = start + header;
        let payload_end = payload_start.checked_add(size).ok_or(ProtocolError::LengthOverflow)?;
        let frame_end = payload_end.checked_add(CRLF.len()).ok_or(ProtocolError::LengthOverflow)?;

        if buf.len() < frame_end {
            return Err(ProtocolError::Incomplete);
        }
        if &buf[payload_end..frame_end] != CRLF {
            return Err(ProtocolError::MissingTerminator);
        }

        Ok((Bytes::copy_from_slice(&buf[payload_start..payload_end]), frame_end - start))
    }

    /**
     * Parses `<prefix><digits>\r\n` starting at `start`.
     * Returns the decimal value and the number of header bytes including the CRLF.
     */
    fn parse_length(buf: &[u8], start: usize, prefix: u8) -> Result<(usize, usize), ProtocolError> {
        let found = *buf.get(start).ok_or(ProtocolError::Incomplete)?;
        if found != prefix {
            return Err(ProtocolError::UnexpectedPrefix {
                expected: char::from(prefix),
                found: char::from(found),
            });
        }

        let digits_start = start + 1;
        let mut cursor = digits_start;
        let mut length: usize = 0;

        loop {
            match buf.get(cursor) {
                None => return Err(ProtocolError::Incomplete),
                Some(b'\r') if cursor > digits_start => break,
                Some(digit @ b'0'..=b'9') => {
                    length = length
                        .checked_mul(10)
                        .and_then(|length| length.checked_add(usize::from(digit - b'0')))
                        .ok_or(ProtocolError::LengthOverflow)?;
                }
                Some(other) => return Err(ProtocolError::InvalidLength(*other)),
            }
            cursor += 1;
        }

        match buf.get(cursor + 1) {
            None => Err(ProtocolError::Incomplete),
            Some(b'\n') => Ok((length, cursor + CRLF.len() - start)),
            Some(_) => Err(ProtocolError::MissingTerminator),
        }
    }
}

/**
 * Encodes a request the way a client would put it on the wire
 */
#[cfg(test)]
pub(crate) fn encode_request(args: &[&str]) -> Vec<u8> {
    let mut frame = format!("*{}\r\n", args.len()).into_bytes();
    for arg in args {
        frame.extend_from_slice(format!("${}\r\n{}\r\n", arg.len(), arg).as_bytes());
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resp::reply::Reply;
    use rstest::rstest;

    fn strings(request: &Request) -> Vec<&str> {
        request
            .iter()
            .map(|arg| std::str::from_utf8(arg).unwrap())
            .collect()
    }

    #[rstest]
    #[case(&["PING"])]
    #[case(&["ECHO", "hello world"])]
    #[case(&["SET", "key", "value", "PX", "100"])]
    #[case(&["GET", ""])]
    fn should_decode_request(#[case] args: &[&str]) {
        let frame = encode_request(args);

        let (request, consumed) = RESPDecoder::decode(&frame).unwrap();

        assert_eq!(args.to_vec(), strings(&request));
        assert_eq!(frame.len(), consumed);
    }

    #[test]
    fn should_decode_empty_array() {
        assert_eq!((Request::new(), 4), RESPDecoder::decode(b"*0\r\n").unwrap());
    }

    #[test]
    fn should_only_consume_first_request() {
        let mut buf = encode_request(&["ECHO", "a"]);
        let first_len = buf.len();
        buf.extend(encode_request(&["PING"]));

        let (first, consumed) = RESPDecoder::decode(&buf).unwrap();
        assert_eq!(vec!["ECHO", "a"], strings(&first));
        assert_eq!(first_len, consumed);

        let (second, _) = RESPDecoder::decode(&buf[consumed..]).unwrap();
        assert_eq!(vec!["PING"], strings(&second));
    }

    #[test]
    fn should_keep_spaces_inside_one_argument() {
        let (request, _) = RESPDecoder::decode(b"*2\r\n$3\r\nSET\r\n$7\r\na b c d\r\n").unwrap();
        assert_eq!(vec!["SET", "a b c d"], strings(&request));
    }

    #[rstest]
    #[case("")]
    #[case("x")]
    #[case("hello")]
    #[case("with\r\ninside")]
    fn bulk_string_survives_encode_then_decode(#[case] payload: &str) {
        let mut frame = b"*1\r\n".to_vec();
        frame.extend_from_slice(&Reply::Bulk(Bytes::copy_from_slice(payload.as_bytes())).to_bytes());

        let (request, _) = RESPDecoder::decode(&frame).unwrap();

        assert_eq!(vec![Bytes::copy_from_slice(payload.as_bytes())], request);
    }

    #[rstest]
    #[case(b"", ProtocolError::Incomplete)]
    #[case(b"*", ProtocolError::Incomplete)]
    #[case(b"*1\r", ProtocolError::Incomplete)]
    #[case(b"*1\r\n$5\r\nab\r\n", ProtocolError::Incomplete)]
    #[case(b"*2\r\n$4\r\nECHO\r\n", ProtocolError::Incomplete)]
    #[case(b"$5\r\nab\r\n", ProtocolError::UnexpectedPrefix { expected: '*', found: '$' })]
    #[case(b"*1\r\n+PING\r\n", ProtocolError::UnexpectedPrefix { expected: '$', found: '+' })]
    #[case(b"*1\r\n$x\r\n", ProtocolError::InvalidLength(b'x'))]
    #[case(b"*-1\r\n", ProtocolError::InvalidLength(b'-'))]
    #[case(b"*\r\n", ProtocolError::InvalidLength(b'\r'))]
    #[case(b"*1\rx", ProtocolError::MissingTerminator)]
    #[case(b"*1\r\n$2\r\nabcd\r\n", ProtocolError::MissingTerminator)]
    #[case(b"*99999999999999999999999\r\n", ProtocolError::LengthOverflow)]
    fn should_reject_malformed_frame(#[case] buf: &[u8], #[case] expected: ProtocolError) {
        assert_eq!(Err(expected), RESPDecoder::decode(buf));
    }

    #[test]
    fn should_decode_well_formed_frame_after_rejecting_truncated_one() {
        assert_eq!(Err(ProtocolError::Incomplete), RESPDecoder::decode(b"*1\r\n$5\r\nab\r\n"));

        let (request, _) = RESPDecoder::decode(&encode_request(&["PING"])).unwrap();
        assert_eq!(vec!["PING"], strings(&request));
    }
}
