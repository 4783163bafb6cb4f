//! SAM text output
//!
//! Writes alignment records as tab-separated SAM lines. The header is
//! optional here, unlike BAM output where htslib always writes it.

use crate::core::{RecordSink, Result};
use rust_htslib::bam::record::{Aux, Record};
use rust_htslib::bam::HeaderView;
use std::fmt::Display;
use std::io::{self, Write};

/// Quality value htslib uses for "no quality"
const MISSING_QUAL: u8 = 0xff;

/// Sink that formats records as SAM text
pub struct SamSink<W: Write> {
    out: W,
    header: HeaderView,
    line: Vec<u8>,
}

impl<W: Write> SamSink<W> {
    /// Wrap `out`; the header is written immediately when `with_header` is set
    pub fn new(mut out: W, header: HeaderView, with_header: bool) -> io::Result<Self> {
        if with_header {
            write_header(&mut out, &header)?;
        }
        Ok(Self {
            out,
            header,
            line: Vec::with_capacity(512),
        })
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink<Record> for SamSink<W> {
    fn write(&mut self, record: &Record) -> Result<()> {
        self.line.clear();
        format_record(&mut self.line, record, &self.header)?;
        self.out.write_all(&self.line)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Write the header text. Headers without any `@SQ` line get one per
/// target so the output stays loadable.
pub fn write_header<W: Write>(out: &mut W, header: &HeaderView) -> io::Result<()> {
    let text = header.as_bytes();
    let text = text.strip_suffix(b"\0").unwrap_or(text);
    out.write_all(text)?;
    if !text.is_empty() && !text.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }

    let has_sq = text.split(|&b| b == b'\n').any(|line| line.starts_with(b"@SQ"));
    if !has_sq {
        for tid in 0..header.target_count() {
            out.write_all(b"@SQ\tSN:")?;
            out.write_all(header.tid2name(tid))?;
            writeln!(out, "\tLN:{}", header.target_len(tid).unwrap_or(0))?;
        }
    }
    Ok(())
}

fn reference_name<'h>(header: &'h HeaderView, tid: i32) -> &'h [u8] {
    if tid < 0 || tid as u32 >= header.target_count() {
        b"*"
    } else {
        header.tid2name(tid as u32)
    }
}

/// Format one record as a SAM line, newline included
pub fn format_record<W: Write>(out: &mut W, record: &Record, header: &HeaderView) -> io::Result<()> {
    out.write_all(record.qname())?;
    write!(out, "\t{}\t", record.flags())?;
    out.write_all(reference_name(header, record.tid()))?;
    write!(out, "\t{}\t{}\t", record.pos() + 1, record.mapq())?;

    if record.cigar_len() == 0 {
        out.write_all(b"*")?;
    } else {
        for op in record.cigar().iter() {
            write!(out, "{}", op)?;
        }
    }

    out.write_all(b"\t")?;
    let mtid = record.mtid();
    if mtid >= 0 && mtid == record.tid() {
        out.write_all(b"=")?;
    } else {
        out.write_all(reference_name(header, mtid))?;
    }
    write!(out, "\t{}\t{}\t", record.mpos() + 1, record.insert_size())?;

    if record.seq_len() == 0 {
        out.write_all(b"*")?;
    } else {
        out.write_all(&record.seq().as_bytes())?;
    }

    out.write_all(b"\t")?;
    let qual = record.qual();
    if qual.is_empty() || qual[0] == MISSING_QUAL {
        out.write_all(b"*")?;
    } else {
        let encoded: Vec<u8> = qual.iter().map(|q| q.saturating_add(33)).collect();
        out.write_all(&encoded)?;
    }

    for aux in record.aux_iter() {
        let (tag, value) = aux.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        out.write_all(b"\t")?;
        out.write_all(tag)?;
        write_aux(out, &value)?;
    }

    out.write_all(b"\n")
}

/// Format a float like C `%g`: six significant digits, trailing zeros
/// dropped, exponent notation outside `1e-4 ..= 1e6`
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let sci = format!("{:.5e}", v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let fixed = format!("{:.*}", (5 - exp) as usize, v);
        trim_fraction(&fixed).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn join<T: Display, I: IntoIterator<Item = T>>(values: I) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn write_aux<W: Write>(out: &mut W, value: &Aux<'_>) -> io::Result<()> {
    match value {
        Aux::Char(c) => write!(out, ":A:{}", *c as char),
        Aux::I8(v) => write!(out, ":i:{}", v),
        Aux::U8(v) => write!(out, ":i:{}", v),
        Aux::I16(v) => write!(out, ":i:{}", v),
        Aux::U16(v) => write!(out, ":i:{}", v),
        Aux::I32(v) => write!(out, ":i:{}", v),
        Aux::U32(v) => write!(out, ":i:{}", v),
        Aux::Float(v) => write!(out, ":f:{}", format_float(*v as f64)),
        Aux::Double(v) => write!(out, ":f:{}", format_float(*v)),
        Aux::String(s) => write!(out, ":Z:{}", s),
        Aux::HexByteArray(s) => write!(out, ":H:{}", s),
        Aux::ArrayI8(a) => write!(out, ":B:c,{}", join(a.iter())),
        Aux::ArrayU8(a) => write!(out, ":B:C,{}", join(a.iter())),
        Aux::ArrayI16(a) => write!(out, ":B:s,{}", join(a.iter())),
        Aux::ArrayU16(a) => write!(out, ":B:S,{}", join(a.iter())),
        Aux::ArrayI32(a) => write!(out, ":B:i,{}", join(a.iter())),
        Aux::ArrayU32(a) => write!(out, ":B:I,{}", join(a.iter())),
        Aux::ArrayFloat(a) => write!(out, ":B:f,{}", join(a.iter().map(|v| format_float(v as f64)))),
    }
}
