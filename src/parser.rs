//! Tokenizer/Parser (spec §4.2): a hand-written byte-level scanner that
//! walks the (already include-resolved) source buffer, recognizing nested
//! `${ ... $}` scopes and the labeled-statement grammar, mutating a
//! [`crate::database::Database`] directly as it goes -- "byte buffer →
//! parser events → mutations on Database + Scope" (spec §2).
//!
//! The grammar-driven-vs-handwritten tradeoff is the one spec §9 calls out
//! explicitly; this follows the handwritten byte-classification style the
//! spec itself is written in, and the teacher's own comment in
//! `database.rs` about segments being "the main unit of recalculation" --
//! dropped here since this spec's parser makes one forward pass over one
//! assembled buffer rather than an incrementally recomputed segment list.

use crate::database::Database;
use crate::diag::ParseError;
use crate::proof::{ProofTok, RawProof};
use crate::util::{is_label_byte, is_symbol_byte, is_whitespace};

/// Parses `buf` (already fully resolved by [`crate::loader`]) into `db`,
/// mutating it statement by statement (spec §4.2).
pub(crate) fn parse(buf: &[u8], db: &mut Database) -> Result<(), ParseError> {
    let mut sc = Scanner::new(buf);
    parse_context(&mut sc, db, Context::Top)
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Context {
    Top,
    Block,
}

fn parse_context(sc: &mut Scanner, db: &mut Database, ctx: Context) -> Result<(), ParseError> {
    loop {
        sc.skip_ws_comments()?;
        if sc.at_eof() {
            return match ctx {
                Context::Top => Ok(()),
                Context::Block => Err(ParseError::UnterminatedBlock { offset: sc.pos() }),
            };
        }

        let off = sc.pos();
        if sc.peek() == b'$' {
            let (intro, ioff) = sc.read_dollar()?;
            match intro {
                b'c' => {
                    if ctx == Context::Block {
                        return Err(ParseError::ConstantInBlock { offset: ioff });
                    }
                    parse_constants(sc, db)?;
                }
                b'v' => parse_variables(sc, db)?,
                b'd' => parse_disjoint(sc, db)?,
                b'{' => {
                    db.push_scope();
                    parse_context(sc, db, Context::Block)?;
                }
                b'}' => {
                    if ctx == Context::Top {
                        return Err(ParseError::UnmatchedCloseBlock { offset: ioff });
                    }
                    db.pop_scope();
                    return Ok(());
                }
                other => {
                    return Err(ParseError::UnexpectedIntroducer {
                        offset: ioff,
                        introducer: (other as char).to_string(),
                    })
                }
            }
        } else {
            let label = sc.read_label()?;
            sc.skip_ws_comments()?;
            let (intro, ioff) = sc.read_dollar()?;
            match intro {
                b'f' => parse_floating(sc, db, &label, off)?,
                b'e' => parse_essential(sc, db, &label, off)?,
                b'a' => parse_axiom(sc, db, &label, off)?,
                b'p' => parse_provable(sc, db, &label, off)?,
                other => {
                    return Err(ParseError::UnexpectedIntroducer {
                        offset: ioff,
                        introducer: (other as char).to_string(),
                    })
                }
            }
        }
    }
}

fn parse_constants(sc: &mut Scanner, db: &mut Database) -> Result<(), ParseError> {
    loop {
        sc.skip_ws_comments()?;
        if sc.peek_is_dot_terminator()? {
            sc.consume_dollar_intro()?;
            return Ok(());
        }
        let (sym, off) = sc.read_symbol()?;
        db.add_constant(&sym, off)?;
    }
}

fn parse_variables(sc: &mut Scanner, db: &mut Database) -> Result<(), ParseError> {
    loop {
        sc.skip_ws_comments()?;
        if sc.peek_is_dot_terminator()? {
            sc.consume_dollar_intro()?;
            return Ok(());
        }
        let (sym, off) = sc.read_symbol()?;
        db.add_variable(&sym, off)?;
    }
}

fn parse_disjoint(sc: &mut Scanner, db: &mut Database) -> Result<(), ParseError> {
    let mut vars = Vec::new();
    loop {
        sc.skip_ws_comments()?;
        if sc.peek_is_dot_terminator()? {
            sc.consume_dollar_intro()?;
            return db.disjoint_stmt(&vars, sc.pos());
        }
        let (sym, off) = sc.read_symbol()?;
        vars.push((sym, off));
    }
}

fn parse_floating(
    sc: &mut Scanner,
    db: &mut Database,
    label: &[u8],
    off: usize,
) -> Result<(), ParseError> {
    sc.skip_ws_comments()?;
    let (typecode, tc_off) = sc.read_symbol()?;
    sc.skip_ws_comments()?;
    let (var, v_off) = sc.read_symbol()?;
    sc.skip_ws_comments()?;
    sc.expect_terminator()?;
    db.floating_stmt(label, off, &typecode, tc_off, &var, v_off)
}

fn parse_essential(
    sc: &mut Scanner,
    db: &mut Database,
    label: &[u8],
    off: usize,
) -> Result<(), ParseError> {
    sc.skip_ws_comments()?;
    let (typecode, tc_off) = sc.read_symbol()?;
    let mut syms = Vec::new();
    loop {
        sc.skip_ws_comments()?;
        if sc.peek_is_dot_terminator()? {
            sc.consume_dollar_intro()?;
            return db.essential_stmt(label, off, &typecode, tc_off, &syms);
        }
        let (sym, s_off) = sc.read_symbol()?;
        syms.push((sym, s_off));
    }
}

fn parse_axiom(
    sc: &mut Scanner,
    db: &mut Database,
    label: &[u8],
    off: usize,
) -> Result<(), ParseError> {
    sc.skip_ws_comments()?;
    let (typecode, tc_off) = sc.read_symbol()?;
    let mut syms = Vec::new();
    loop {
        sc.skip_ws_comments()?;
        if sc.peek_is_dot_terminator()? {
            sc.consume_dollar_intro()?;
            return db.axiom_stmt(label, off, &typecode, tc_off, &syms);
        }
        let (sym, s_off) = sc.read_symbol()?;
        syms.push((sym, s_off));
    }
}

fn parse_provable(
    sc: &mut Scanner,
    db: &mut Database,
    label: &[u8],
    off: usize,
) -> Result<(), ParseError> {
    sc.skip_ws_comments()?;
    let (typecode, tc_off) = sc.read_symbol()?;
    let mut syms = Vec::new();
    loop {
        sc.skip_ws_comments()?;
        if sc.at_eq_sign()? {
            sc.consume_eq_sign()?;
            break;
        }
        let (sym, s_off) = sc.read_symbol()?;
        syms.push((sym, s_off));
    }
    let proof = parse_proof_body(sc, db)?;
    db.provable_stmt(label, off, &typecode, tc_off, &syms, proof)
}

/// Reads the proof body following `$=` up to (and consuming) the
/// terminating `$.` (spec §4.3).
fn parse_proof_body(sc: &mut Scanner, db: &mut Database) -> Result<RawProof, ParseError> {
    sc.skip_ws_comments()?;
    if sc.peek() == b'(' {
        sc.advance_one();
        let mut extra = Vec::new();
        loop {
            sc.skip_ws_comments()?;
            if sc.peek() == b')' {
                sc.advance_one();
                break;
            }
            let (sym, off) = sc.read_label_token()?;
            extra.push(db.resolve_proof_label(&sym, off)?);
        }
        sc.skip_ws_comments()?;
        let mut chars = Vec::new();
        loop {
            if sc.at_eof() {
                return Err(ParseError::UnexpectedEof { offset: sc.pos() });
            }
            if sc.peek() == b'$' {
                sc.expect_terminator()?;
                return Ok(RawProof::Compressed { extra, chars });
            }
            let b = sc.advance_one();
            if is_whitespace(b) {
                continue;
            }
            chars.push(b);
        }
    } else {
        let mut toks = Vec::new();
        loop {
            sc.skip_ws_comments()?;
            if sc.peek_is_dot_terminator()? {
                sc.consume_dollar_intro()?;
                return Ok(RawProof::Uncompressed(toks));
            }
            let (sym, off) = sc.read_label_token()?;
            if sym == b"?" {
                toks.push(ProofTok::Unknown);
            } else {
                toks.push(ProofTok::Label(db.resolve_proof_label(&sym, off)?));
            }
        }
    }
}

/// Byte-level scanner over an already fully loaded source buffer.
struct Scanner<'a> {
    buf: &'a [u8],
    i: usize,
}

impl<'a> Scanner<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Scanner { buf, i: 0 }
    }

    fn pos(&self) -> usize {
        self.i
    }

    fn at_eof(&self) -> bool {
        self.i >= self.buf.len()
    }

    fn peek(&self) -> u8 {
        self.buf[self.i]
    }

    fn advance_one(&mut self) -> u8 {
        let b = self.buf[self.i];
        self.i += 1;
        b
    }

    /// spec §4.2 `skip_whitespace_and_comments`.
    fn skip_ws_comments(&mut self) -> Result<(), ParseError> {
        loop {
            while self.i < self.buf.len() && is_whitespace(self.buf[self.i]) {
                self.i += 1;
            }
            if self.i + 1 < self.buf.len() && self.buf[self.i] == b'$' && self.buf[self.i + 1] == b'(' {
                let start = self.i;
                let mut j = self.i + 2;
                loop {
                    if j + 1 >= self.buf.len() {
                        return Err(ParseError::MalformedComment { offset: start });
                    }
                    if self.buf[j] == b'$' && self.buf[j + 1] == b'(' {
                        return Err(ParseError::NestedComment { offset: j });
                    }
                    if self.buf[j] == b'$' && self.buf[j + 1] == b')' {
                        j += 2;
                        break;
                    }
                    j += 1;
                }
                self.i = j;
                continue;
            }
            break;
        }
        Ok(())
    }

    /// Reads a `$X` two-byte directive token, returning `X` and the offset
    /// of the `$`.
    fn read_dollar(&mut self) -> Result<(u8, usize), ParseError> {
        let off = self.i;
        if self.at_eof() {
            return Err(ParseError::UnexpectedEof { offset: off });
        }
        if self.buf[self.i] != b'$' || self.i + 1 >= self.buf.len() {
            return Err(ParseError::UnexpectedEof { offset: off });
        }
        let c = self.buf[self.i + 1];
        self.i += 2;
        Ok((c, off))
    }

    /// spec §4.2 `read_symbol`: a maximal run of printable ASCII excluding
    /// `$` and whitespace. Assumes whitespace/comments already skipped.
    fn read_symbol(&mut self) -> Result<(Vec<u8>, usize), ParseError> {
        let start = self.i;
        if self.at_eof() {
            return Err(ParseError::UnexpectedEof { offset: start });
        }
        while self.i < self.buf.len() && is_symbol_byte(self.buf[self.i]) {
            self.i += 1;
        }
        if self.i == start {
            return Err(ParseError::EmptySymbol { offset: start });
        }
        Ok((self.buf[start..self.i].to_vec(), start))
    }

    /// A proof token: either a label (`read_label` charset) or the single
    /// byte `?`.
    fn read_label_token(&mut self) -> Result<(Vec<u8>, usize), ParseError> {
        let start = self.i;
        if !self.at_eof() && self.buf[self.i] == b'?' {
            self.i += 1;
            return Ok((b"?".to_vec(), start));
        }
        self.read_label()
    }

    /// spec §4.2 `read_label`: a maximal run in `[A-Za-z0-9._-]`.
    fn read_label(&mut self) -> Result<Vec<u8>, ParseError> {
        let start = self.i;
        while self.i < self.buf.len() && is_label_byte(self.buf[self.i]) {
            self.i += 1;
        }
        if self.i == start {
            return Err(ParseError::EmptySymbol { offset: start });
        }
        Ok(self.buf[start..self.i].to_vec())
    }

    /// True if the next token is the `$.` terminator; does not consume it.
    fn peek_is_dot_terminator(&self) -> Result<bool, ParseError> {
        Ok(self.i + 1 < self.buf.len() && self.buf[self.i] == b'$' && self.buf[self.i + 1] == b'.')
    }

    fn at_eq_sign(&self) -> Result<bool, ParseError> {
        Ok(self.i + 1 < self.buf.len() && self.buf[self.i] == b'$' && self.buf[self.i + 1] == b'=')
    }

    fn consume_eq_sign(&mut self) -> Result<(), ParseError> {
        let (c, off) = self.read_dollar()?;
        if c != b'=' {
            return Err(ParseError::UnexpectedIntroducer {
                offset: off,
                introducer: (c as char).to_string(),
            });
        }
        Ok(())
    }

    /// Consumes the `$.` terminator already confirmed present by
    /// [`Self::peek_is_dot_terminator`].
    fn consume_dollar_intro(&mut self) -> Result<(), ParseError> {
        let (c, off) = self.read_dollar()?;
        if c != b'.' {
            return Err(ParseError::MissingTerminator { offset: off });
        }
        Ok(())
    }

    /// Skips whitespace/comments then requires and consumes `$.`.
    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        self.skip_ws_comments()?;
        if !self.peek_is_dot_terminator()? {
            return Err(ParseError::MissingTerminator { offset: self.i });
        }
        self.consume_dollar_intro()
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod parser_tests;
