pub use std::{
    collections::{BTreeMap, VecDeque},
    fs::File,
    hash::BuildHasherDefault,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
pub use ahash::AHasher;
pub use clap::{Parser, ValueEnum};
pub use indexmap::IndexMap;
pub use itertools::Itertools;
pub use rayon::prelude::*;
pub use thiserror::Error;
pub use tracing::{debug, info, trace, warn};

pub use crate::{
    Bin, Item, Schedule,
    algo::{Dual, Packer, Strategy, heuristic::FifthFit},
    cover::{Budget, DEFAULT_MAX_STATES},
    histogram::{Histogram, Rounding},
    makespan::{CancelToken, SearchConfig, DEFAULT_REL_TOLERANCE},
};

/// The unit for measuring item sizes, bin fills and makespans.
///
/// Inside the engine every bin has unit capacity; callers' sizes are
/// brought into that frame by dividing with a candidate makespan.
pub type Size = f64;

/// A group of items, sorted in order of increasing size once it has
/// passed through [`crate::items::init`].
pub type ItemSet = Vec<Item>;

/// An ordered list of bins that exactly partitions some input.
pub type Solution = Vec<Bin>;

pub type PackResult<T> = Result<T, PackError>;

/// Every bin has room for one unit of size.
pub const CAPACITY: Size = 1.0;

/// Floating point sums are compared against [`CAPACITY`] with this
/// much leeway, so that e.g. 0.5 + 0.5 still fits.
pub const FIT_SLACK: Size = 1e-9;

/// Names the pipeline stage an error originated from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Input,
    Histogram,
    Enumeration,
    CoverSearch,
    SmallItems,
    Heuristic,
    OuterSearch,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Input        => "input",
            Stage::Histogram    => "histogram",
            Stage::Enumeration  => "enumeration",
            Stage::CoverSearch  => "cover search",
            Stage::SmallItems   => "small-item packing",
            Stage::Heuristic    => "heuristic packing",
            Stage::OuterSearch  => "outer search",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PackError {
    #[error("[{stage}] invalid parameter: {reason}")]
    InvalidParameter {
        stage:  Stage,
        reason: String,
    },
    #[error("[{stage}] no feasible upper bound after {doublings} doublings (last tried {upper})")]
    InfeasibleUpperBound {
        stage:      Stage,
        upper:      Size,
        doublings:  u32,
    },
    #[error("[{stage}] frontier exhausted after {explored} states without covering the histogram")]
    SearchExhausted {
        stage:      Stage,
        explored:   usize,
    },
    #[error("[{stage}] budget exceeded after {explored} states")]
    BudgetExceeded {
        stage:      Stage,
        explored:   usize,
    },
    #[error("[{stage}] cancelled by caller")]
    Cancelled {
        stage:  Stage,
    },
    #[error("[{stage}] bounds lost precision: lower = {lower}, upper = {upper}")]
    NumericPrecision {
        stage:  Stage,
        lower:  Size,
        upper:  Size,
    },
}

impl PackError {
    pub fn invalid(stage: Stage, reason: impl Into<String>) -> Self {
        PackError::InvalidParameter {
            stage,
            reason: reason.into(),
        }
    }

    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            PackError::InvalidParameter { stage, .. }       => *stage,
            PackError::InfeasibleUpperBound { stage, .. }   => *stage,
            PackError::SearchExhausted { stage, .. }        => *stage,
            PackError::BudgetExceeded { stage, .. }         => *stage,
            PackError::Cancelled { stage }                  => *stage,
            PackError::NumericPrecision { stage, .. }       => *stage,
        }
    }
}

/// Appears while reading raw sizes, before any of them
/// reaches the engine.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: cannot parse {content:?} as a size")]
    Malformed {
        line:       usize,
        content:    String,
    },
}

//---START EXTERNAL INTERFACES
// Callers own ingestion. The types below cover the plain
// "one size per line" lists that simulation traces get
// dumped into; anything else only needs to implement
// `SizeSource`.

/// Defines the interface for reading item sizes.
pub trait SizeSource {
    fn read_sizes(&self) -> Result<Vec<Size>, InputError>;
}

/// Reads one size per line. Blank lines are skipped and
/// surrounding whitespace is ignored. A path of `-` means stdin.
pub struct SizeListParser {
    pub path: PathBuf,
}

impl SizeListParser {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
        }
    }

    fn reads_stdin(&self) -> bool {
        self.path.as_path() == Path::new("-")
    }
}

impl SizeSource for SizeListParser {
    fn read_sizes(&self) -> Result<Vec<Size>, InputError> {
        if self.reads_stdin() {
            parse_lines(std::io::stdin().lock())
        } else {
            let fd = File::open(&self.path)?;
            parse_lines(BufReader::new(fd))
        }
    }
}

pub fn parse_lines<R: BufRead>(reader: R) -> Result<Vec<Size>, InputError> {
    let mut res = vec![];
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match trimmed.parse::<Size>() {
            Ok(v)   => { res.push(v); },
            Err(_)  => {
                return Err(InputError::Malformed {
                    line:       idx + 1,
                    content:    trimmed.to_string(),
                });
            }
        }
    }

    Ok(res)
}
//---END EXTERNAL INTERFACES
