//! Destinations for flagged purchases.

use crate::{error::AnomalyResult, event::FlaggedPurchase};
use std::io::Write;

/// Receives flagged purchases in the order they are detected.
pub trait FlagSink {
    fn emit(&mut self, flag: &FlaggedPurchase) -> AnomalyResult<()>;

    fn flush(&mut self) -> AnomalyResult<()> {
        Ok(())
    }
}

/// Collects flags in memory.
impl FlagSink for Vec<FlaggedPurchase> {
    fn emit(&mut self, flag: &FlaggedPurchase) -> AnomalyResult<()> {
        self.push(flag.clone());
        Ok(())
    }
}

impl<S: FlagSink + ?Sized> FlagSink for &mut S {
    fn emit(&mut self, flag: &FlaggedPurchase) -> AnomalyResult<()> {
        (**self).emit(flag)
    }

    fn flush(&mut self) -> AnomalyResult<()> {
        (**self).flush()
    }
}

/// One JSON object per line, the flagged-purchases file format.
pub struct JsonLinesSink<W: Write> {
    writer:  W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FlagSink for JsonLinesSink<W> {
    fn emit(&mut self, flag: &FlaggedPurchase) -> AnomalyResult<()> {
        writeln!(self.writer, "{}", flag.to_json_line()?)?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> AnomalyResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
