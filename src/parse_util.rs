use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected end of input, expected '{exp}'")]
    UnexpectedEof { exp: char },

    #[error("Expected '{exp}', but got '{got}'")]
    UnexpectedToken { exp: char, got: char },

    #[error("Unexpected trailing input \"{rest}\"")]
    TrailingInput { rest: String },
}

/// Consumes the slice until a non-ascii whitespace character is reached.
pub fn take_ws(bytes: &[u8]) -> &[u8] {
    let (_, bytes) = take_while_fn(|b| b.is_ascii_whitespace(), bytes);

    bytes
}

/// Takes the next character from the slice. If none is found, the slice is left as-is.
pub const fn take_1(bytes: &[u8]) -> (Option<u8>, &[u8]) {
    let [b, bytes @ ..] = bytes else {
        return (None, bytes);
    };

    (Some(*b), bytes)
}

/// Expects the next character in `bytes` to be `b`. Otherwise leaves `bytes` unchanged.
pub fn expect(b: u8, bytes: &[u8]) -> ParseResult<&[u8]> {
    let (Some(a), rest) = take_1(bytes) else {
        return Err(ParseError::UnexpectedEof { exp: b as char });
    };

    if a != b {
        return Err(ParseError::UnexpectedToken {
            exp: b as char,
            got: a as char,
        });
    }

    Ok(rest)
}

/// Consumes `b` if it is the next character, and leaves `bytes` as-is otherwise.
pub fn skip(b: u8, bytes: &[u8]) -> &[u8] {
    expect(b, bytes).unwrap_or(bytes)
}

/// Splits off the longest prefix whose bytes all satisfy `P`. The prefix may be empty.
pub fn take_while_fn<P>(p: P, bytes: &[u8]) -> (&[u8], &[u8])
where
    P: Fn(u8) -> bool,
{
    let i = bytes.iter().position(|&b| !p(b)).unwrap_or(bytes.len());

    bytes.split_at(i)
}

/// Succeeds only if nothing but whitespace is left in `bytes`.
pub fn expect_end(bytes: &[u8]) -> ParseResult<()> {
    let bytes = take_ws(bytes);

    if bytes.is_empty() {
        Ok(())
    } else {
        Err(ParseError::TrailingInput {
            rest: String::from_utf8_lossy(bytes).to_string(),
        })
    }
}
