//! NDC-style stage text parser.
//!
//! The format is line oriented. Blank lines and lines starting with `#` are
//! ignored. A line containing `theoretical` or `measured` opens a stage,
//! and the record type is picked by substring:
//!
//! ```text
//! paz    norm line, pole count, rows "re im [re_err im_err]",
//!        zero count, rows "re im [re_err im_err]"
//! PAZ2   header "PAZ2 <norm> <npoles> <nzeros>", then 2-column pole
//!        rows followed by 2-column zero rows
//! fap    count line, rows "freq amp phase_deg [amp_err phase_err]"
//! FAP2   same body as fap
//! fir    input sample rate line, numerator count, rows "value [error]",
//!        denominator count, rows "value [error]"
//! FIR2   header "FIR2 <ncoef>", then ncoef whitespace-separated values on
//!        any number of lines; the input rate comes from a preceding DIG2
//! DIG2   "DIG2 <sample_rate>", sets the input rate of the next stage
//! ```
//!
//! Poles and zeros are in radians per second, phases are converted from
//! degrees to radians.

use crate::error::ParseError;
use lib_types::Complex64;
use nom::{
    character::complete::{digit1, space0},
    combinator::{all_consuming, map_res},
    multi::many0,
    number::complete::double,
    sequence::{preceded, terminated},
    IResult, Parser,
};
use std::iter::{Enumerate, Peekable};
use std::path::Path;
use std::str::Lines;

/// One parsed response stage.
#[derive(Clone, Debug, PartialEq)]
pub enum Stage {
    /// Analogue poles and zeros.
    Paz {
        norm: f64,
        poles: Vec<Complex64>,
        zeros: Vec<Complex64>,
    },
    /// Tabulated frequency/amplitude/phase, phase in radians.
    Fap {
        frequencies: Vec<f64>,
        amplitudes: Vec<f64>,
        phases: Vec<f64>,
    },
    /// Digital filter; an empty denominator means pure FIR.
    Fir {
        input_rate: f64,
        numerator: Vec<f64>,
        denominator: Vec<f64>,
    },
}

impl Stage {
    pub fn kind(&self) -> &'static str {
        match self {
            Stage::Paz { .. } => "paz",
            Stage::Fap { .. } => "fap",
            Stage::Fir { .. } => "fir",
        }
    }
}

/// A stage together with the line that opened it.
#[derive(Clone, Debug, PartialEq)]
pub struct StageRecord {
    pub line: usize,
    pub stage: Stage,
}

/// Parse stage text held in memory.
pub fn parse_stages(text: &str) -> Result<Vec<StageRecord>, ParseError> {
    let mut lines = DataLines::new(text);
    let mut stages = Vec::new();
    let mut pending_rate: Option<f64> = None;

    while let Some((line_no, line)) = lines.next_data() {
        if line.contains("DIG2") {
            let fields = keyword_fields(line, "DIG2");
            pending_rate = Some(field_f64(&fields, 0, line_no, "DIG2 sample rate")?);
            continue;
        }
        if !is_stage_line(line) {
            tracing::trace!(line = line_no, "skipping unrecognized line");
            continue;
        }

        let stage = if line.contains("PAZ2") {
            parse_paz2(&mut lines, line_no, line)?
        } else if line.contains("FAP2") {
            parse_fap(&mut lines, line_no, "FAP2")?
        } else if line.contains("FIR2") {
            let rate = pending_rate.take().ok_or(ParseError::MissingPredecessor {
                line: line_no,
                stage: "FIR2",
                required: "DIG2",
            })?;
            parse_fir2(&mut lines, line_no, line, rate)?
        } else if line.contains("paz") {
            parse_paz(&mut lines, line_no)?
        } else if line.contains("fap") {
            parse_fap(&mut lines, line_no, "fap")?
        } else if line.contains("fir") {
            parse_fir(&mut lines, line_no)?
        } else {
            tracing::debug!(line = line_no, "stage line without a known record type");
            pending_rate = None;
            continue;
        };

        tracing::trace!(line = line_no, kind = stage.kind(), "parsed stage");
        pending_rate = None;
        stages.push(StageRecord { line: line_no, stage });
    }

    if stages.is_empty() {
        return Err(ParseError::NoStages);
    }
    Ok(stages)
}

/// Parse a stage file.
pub fn parse_stage_file(path: &Path) -> Result<Vec<StageRecord>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_stages(&content)
}

fn is_stage_line(line: &str) -> bool {
    line.contains("theoretical") || line.contains("measured")
}

fn is_comment_or_blank(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Cursor over non-blank, non-comment lines with 1-based line numbers.
struct DataLines<'a> {
    inner: Peekable<Enumerate<Lines<'a>>>,
}

impl<'a> DataLines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate().peekable(),
        }
    }

    fn peek_data(&mut self) -> Option<(usize, &'a str)> {
        while let Some(&(index, line)) = self.inner.peek() {
            if !is_comment_or_blank(line) {
                return Some((index + 1, line));
            }
            self.inner.next();
        }
        None
    }

    fn next_data(&mut self) -> Option<(usize, &'a str)> {
        let item = self.peek_data();
        if item.is_some() {
            self.inner.next();
        }
        item
    }

    /// Next line belonging to the current stage; `None` at a new stage or
    /// end of input.
    fn body_line(&mut self) -> Option<(usize, &'a str)> {
        match self.peek_data() {
            Some((_, line)) if is_stage_line(line) || line.contains("DIG2") => None,
            _ => self.next_data(),
        }
    }

    fn expect_line(&mut self, owner: usize, what: &str) -> Result<(usize, &'a str), ParseError> {
        self.body_line()
            .ok_or_else(|| ParseError::syntax(owner, format!("expected {what}")))
    }

    /// Read `expected` rows of `min..=max` numbers each.
    fn rows(
        &mut self,
        owner: usize,
        stage: &'static str,
        expected: usize,
        min: usize,
        max: usize,
    ) -> Result<Vec<Vec<f64>>, ParseError> {
        let mut rows = Vec::with_capacity(expected);
        while rows.len() < expected {
            let (line_no, text) = self.body_line().ok_or(ParseError::LengthMismatch {
                line: owner,
                stage,
                expected,
                actual: rows.len(),
            })?;
            rows.push(parse_row(line_no, text, min, max)?);
        }
        Ok(rows)
    }
}

// ============================================================================
// Nom Parsers
// ============================================================================

fn number(input: &str) -> IResult<&str, f64> {
    preceded(space0, double).parse(input)
}

fn scalar(input: &str) -> IResult<&str, f64> {
    all_consuming(double).parse(input)
}

fn numbers(input: &str) -> IResult<&str, Vec<f64>> {
    all_consuming(terminated(many0(number), space0)).parse(input)
}

fn count(input: &str) -> IResult<&str, usize> {
    preceded(space0, map_res(digit1, |digits: &str| digits.parse::<usize>())).parse(input)
}

fn parse_row(line_no: usize, text: &str, min: usize, max: usize) -> Result<Vec<f64>, ParseError> {
    let (_, values) = numbers(text)
        .map_err(|_| ParseError::syntax(line_no, format!("malformed numeric row '{}'", text.trim())))?;
    if values.len() < min || values.len() > max {
        return Err(ParseError::syntax(
            line_no,
            format!("expected {min} to {max} values, found {}", values.len()),
        ));
    }
    Ok(values)
}

fn parse_count(line_no: usize, text: &str, what: &str) -> Result<usize, ParseError> {
    count(text)
        .map(|(_, n)| n)
        .map_err(|_| ParseError::syntax(line_no, format!("expected {what}, found '{}'", text.trim())))
}

/// Tokens following the token that contains `keyword`.
fn keyword_fields<'a>(line: &'a str, keyword: &str) -> Vec<&'a str> {
    line.split_whitespace()
        .skip_while(|token| !token.contains(keyword))
        .skip(1)
        .collect()
}

fn field_f64(fields: &[&str], index: usize, line_no: usize, what: &str) -> Result<f64, ParseError> {
    let token = fields
        .get(index)
        .ok_or_else(|| ParseError::syntax(line_no, format!("missing {what}")))?;
    scalar(token)
        .map(|(_, v)| v)
        .map_err(|_| ParseError::syntax(line_no, format!("invalid {what} '{token}'")))
}

fn field_usize(fields: &[&str], index: usize, line_no: usize, what: &str) -> Result<usize, ParseError> {
    let token = fields
        .get(index)
        .ok_or_else(|| ParseError::syntax(line_no, format!("missing {what}")))?;
    parse_count(line_no, token, what)
}

// ============================================================================
// Record bodies
// ============================================================================

fn to_roots(rows: Vec<Vec<f64>>) -> Vec<Complex64> {
    rows.into_iter().map(|r| Complex64::new(r[0], r[1])).collect()
}

fn parse_paz(lines: &mut DataLines<'_>, owner: usize) -> Result<Stage, ParseError> {
    let (norm_line, text) = lines.expect_line(owner, "normalization factor")?;
    let norm = parse_row(norm_line, text, 1, 2)?[0];

    let (count_line, text) = lines.expect_line(owner, "pole count")?;
    let npoles = parse_count(count_line, text, "pole count")?;
    let poles = to_roots(lines.rows(owner, "paz", npoles, 2, 4)?);

    let (count_line, text) = lines.expect_line(owner, "zero count")?;
    let nzeros = parse_count(count_line, text, "zero count")?;
    let zeros = to_roots(lines.rows(owner, "paz", nzeros, 2, 4)?);

    Ok(Stage::Paz { norm, poles, zeros })
}

fn parse_paz2(lines: &mut DataLines<'_>, owner: usize, header: &str) -> Result<Stage, ParseError> {
    let fields = keyword_fields(header, "PAZ2");
    let norm = field_f64(&fields, 0, owner, "PAZ2 normalization factor")?;
    let npoles = field_usize(&fields, 1, owner, "PAZ2 pole count")?;
    let nzeros = field_usize(&fields, 2, owner, "PAZ2 zero count")?;

    let poles = to_roots(lines.rows(owner, "PAZ2", npoles, 2, 2)?);
    let zeros = to_roots(lines.rows(owner, "PAZ2", nzeros, 2, 2)?);

    Ok(Stage::Paz { norm, poles, zeros })
}

fn parse_fap(lines: &mut DataLines<'_>, owner: usize, stage: &'static str) -> Result<Stage, ParseError> {
    let (count_line, text) = lines.expect_line(owner, "row count")?;
    let n = parse_count(count_line, text, "row count")?;
    let rows = lines.rows(owner, stage, n, 3, 5)?;

    let mut frequencies = Vec::with_capacity(n);
    let mut amplitudes = Vec::with_capacity(n);
    let mut phases = Vec::with_capacity(n);
    for row in rows {
        frequencies.push(row[0]);
        amplitudes.push(row[1]);
        phases.push(row[2].to_radians());
    }

    Ok(Stage::Fap {
        frequencies,
        amplitudes,
        phases,
    })
}

fn parse_fir(lines: &mut DataLines<'_>, owner: usize) -> Result<Stage, ParseError> {
    let (rate_line, text) = lines.expect_line(owner, "input sample rate")?;
    let input_rate = parse_row(rate_line, text, 1, 2)?[0];

    let (count_line, text) = lines.expect_line(owner, "numerator count")?;
    let nnum = parse_count(count_line, text, "numerator count")?;
    let numerator = lines.rows(owner, "fir", nnum, 1, 2)?.into_iter().map(|r| r[0]).collect();

    let (count_line, text) = lines.expect_line(owner, "denominator count")?;
    let nden = parse_count(count_line, text, "denominator count")?;
    let denominator = lines.rows(owner, "fir", nden, 1, 2)?.into_iter().map(|r| r[0]).collect();

    Ok(Stage::Fir {
        input_rate,
        numerator,
        denominator,
    })
}

fn parse_fir2(
    lines: &mut DataLines<'_>,
    owner: usize,
    header: &str,
    input_rate: f64,
) -> Result<Stage, ParseError> {
    let fields = keyword_fields(header, "FIR2");
    let n = field_usize(&fields, 0, owner, "FIR2 coefficient count")?;

    let mut numerator = Vec::with_capacity(n);
    while numerator.len() < n {
        let (line_no, text) = lines.body_line().ok_or(ParseError::LengthMismatch {
            line: owner,
            stage: "FIR2",
            expected: n,
            actual: numerator.len(),
        })?;
        numerator.extend(parse_row(line_no, text, 1, usize::MAX)?);
    }
    if numerator.len() != n {
        return Err(ParseError::LengthMismatch {
            line: owner,
            stage: "FIR2",
            expected: n,
            actual: numerator.len(),
        });
    }

    Ok(Stage::Fir {
        input_rate,
        numerator,
        denominator: Vec::new(),
    })
}
