use std::io::{self, Write};

use crate::parser::ParserError;

/// writes parse failures to an error channel, kept apart from normal output
pub struct Reporter<W: Write> {
    out: W,
    reported: usize,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, reported: 0 }
    }

    pub fn report(&mut self, err: &ParserError) -> io::Result<()> {
        self.reported += 1;
        writeln!(self.out, "log_error: {}", err)
    }

    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
