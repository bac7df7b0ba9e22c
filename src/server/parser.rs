//! Incremental command token parser.
//!
//! The wire protocol frames client requests as fixed-width 3-byte ASCII
//! tokens with no separators. Receive events can split a token at any
//! byte boundary, so the parser carries leftover bytes across feeds
//! instead of dropping a trailing partial token.

/// Width of one command token on the wire.
pub const TOKEN_LEN: usize = 3;

/// A complete 3-byte command token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `req` — request one random entry.
    Req,
    /// `end` — close the session.
    End,
    /// `sta` — request the diagnostics line.
    Sta,
    /// Anything else; carries the offending bytes for logging.
    Unknown([u8; TOKEN_LEN]),
}

/// Accumulates received bytes and yields complete tokens.
///
/// Between feeds the parser holds at most `TOKEN_LEN - 1` bytes of a
/// partial token once drained.
#[derive(Debug, Default)]
pub struct TokenParser {
    pending: Vec<u8>,
}

impl TokenParser {
    /// Creates an empty parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends received bytes to the pending buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Yields the next complete token, or `None` while fewer than
    /// [`TOKEN_LEN`] bytes are pending.
    pub fn next_token(&mut self) -> Option<Token> {
        if self.pending.len() < TOKEN_LEN {
            return None;
        }
        let mut raw = [0u8; TOKEN_LEN];
        raw.copy_from_slice(&self.pending[..TOKEN_LEN]);
        self.pending.drain(..TOKEN_LEN);

        Some(match &raw {
            b"req" => Token::Req,
            b"end" => Token::End,
            b"sta" => Token::Sta,
            _ => Token::Unknown(raw),
        })
    }

    /// Bytes of a partial token currently carried.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_tokens() {
        let mut parser = TokenParser::new();
        parser.feed(b"req");
        assert_eq!(parser.next_token(), Some(Token::Req));
        parser.feed(b"end");
        assert_eq!(parser.next_token(), Some(Token::End));
        parser.feed(b"sta");
        assert_eq!(parser.next_token(), Some(Token::Sta));
        assert_eq!(parser.next_token(), None);
    }

    #[test]
    fn test_partial_token_carried_across_feeds() {
        let mut parser = TokenParser::new();
        parser.feed(b"re");
        assert_eq!(parser.next_token(), None);
        assert_eq!(parser.pending_len(), 2);
        parser.feed(b"q");
        assert_eq!(parser.next_token(), Some(Token::Req));
        assert_eq!(parser.pending_len(), 0);
    }

    #[test]
    fn test_multiple_tokens_in_one_feed() {
        let mut parser = TokenParser::new();
        parser.feed(b"reqstaend");
        assert_eq!(parser.next_token(), Some(Token::Req));
        assert_eq!(parser.next_token(), Some(Token::Sta));
        assert_eq!(parser.next_token(), Some(Token::End));
        assert_eq!(parser.next_token(), None);
    }

    #[test]
    fn test_unknown_token_keeps_bytes() {
        let mut parser = TokenParser::new();
        parser.feed(b"xyzreq");
        assert_eq!(parser.next_token(), Some(Token::Unknown(*b"xyz")));
        // Subsequent bytes are not consumed by the bad token.
        assert_eq!(parser.next_token(), Some(Token::Req));
    }

    #[test]
    fn test_split_mid_stream() {
        let mut parser = TokenParser::new();
        parser.feed(b"reqre");
        assert_eq!(parser.next_token(), Some(Token::Req));
        assert_eq!(parser.next_token(), None);
        parser.feed(b"qsta");
        assert_eq!(parser.next_token(), Some(Token::Req));
        assert_eq!(parser.next_token(), Some(Token::Sta));
    }
}
