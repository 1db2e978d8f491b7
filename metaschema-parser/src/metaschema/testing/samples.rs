//! Sample file finder and loader
//!
//! Samples live under `metaschema-parser/samples/<category>/`. File names start with a number
//! followed by a dash (`01-counter.msc`); the number is how tests address them. Two files
//! resolving to the same number in one directory is an error in the corpus.

use crate::metaschema::analysis::Analyzer;
use crate::metaschema::asg;
use crate::metaschema::lexing::{tokenize, Token};
use crate::metaschema::parsing::{parse, ParseOutput};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SAMPLES_DIR: &str = "samples";
const EXTENSION: &str = "msc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SampleCategory {
    /// Whole documents: imports, uses, namespaces
    Documents,
    Schemas,
    Types,
    /// Sources that must produce diagnostics
    Errors,
}

impl SampleCategory {
    pub const ALL: [SampleCategory; 4] = [
        SampleCategory::Documents,
        SampleCategory::Schemas,
        SampleCategory::Types,
        SampleCategory::Errors,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            SampleCategory::Documents => "documents",
            SampleCategory::Schemas => "schemas",
            SampleCategory::Types => "types",
            SampleCategory::Errors => "errors",
        }
    }

    /// Whether samples of this category are expected to parse cleanly.
    pub fn is_valid(&self) -> bool {
        !matches!(self, SampleCategory::Errors)
    }
}

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("no sample #{number} in {dir}")]
    NotFound { dir: String, number: usize },
    #[error("sample #{number} appears more than once in {dir}")]
    DuplicateNumber { dir: String, number: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub fn samples_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(SAMPLES_DIR)
}

pub fn category_root(category: SampleCategory) -> PathBuf {
    samples_root().join(category.dir_name())
}

/// Maps the number prefix of every sample in `dir` to its path.
pub fn list_files_by_number(dir: &Path) -> Result<BTreeMap<usize, PathBuf>, SampleError> {
    let mut numbers = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(true, |ext| ext != EXTENSION) {
            continue;
        }
        let Some(number) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.split('-').next())
            .and_then(|prefix| prefix.parse::<usize>().ok())
        else {
            continue;
        };
        if numbers.insert(number, path).is_some() {
            return Err(SampleError::DuplicateNumber {
                dir: dir.display().to_string(),
                number,
            });
        }
    }

    Ok(numbers)
}

pub fn find_sample(category: SampleCategory, number: usize) -> Result<PathBuf, SampleError> {
    let dir = category_root(category);
    let mut numbers = list_files_by_number(&dir)?;
    numbers.remove(&number).ok_or_else(|| SampleError::NotFound {
        dir: dir.display().to_string(),
        number,
    })
}

/// A sample addressed by category and number
///
/// The loaders panic: a missing or unreadable sample is a broken test corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub category: SampleCategory,
    pub number: usize,
}

impl Sample {
    pub fn new(category: SampleCategory, number: usize) -> Self {
        Self { category, number }
    }

    pub fn path(&self) -> PathBuf {
        find_sample(self.category, self.number)
            .unwrap_or_else(|err| panic!("failed to find sample: {err}"))
    }

    pub fn source(&self) -> String {
        let path = self.path();
        fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()))
    }

    /// A stable document URI, relative to the samples root.
    pub fn uri(&self) -> String {
        let path = self.path();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        format!("samples/{}/{}", self.category.dir_name(), name)
    }

    /// Tokens of the sample, panicking on a lexer error.
    pub fn tokenize(&self) -> Vec<Token> {
        let output = tokenize(&self.source());
        if let Some(err) = output.error {
            panic!("sample {} does not lex: {err} at {}", self.uri(), err.range());
        }
        output.tokens
    }

    pub fn parse(&self) -> ParseOutput {
        parse(&self.uri(), &self.source())
    }

    pub fn lower(&self) -> asg::Document {
        let uri = self.uri();
        let output = self.parse();
        Analyzer::new().add_document(&uri, &output.document)
    }
}

/// Entry points to the sample corpus
pub struct Samples;

impl Samples {
    pub fn document(number: usize) -> Sample {
        Sample::new(SampleCategory::Documents, number)
    }

    pub fn schema(number: usize) -> Sample {
        Sample::new(SampleCategory::Schemas, number)
    }

    pub fn types(number: usize) -> Sample {
        Sample::new(SampleCategory::Types, number)
    }

    pub fn errors(number: usize) -> Sample {
        Sample::new(SampleCategory::Errors, number)
    }

    /// Every sample in the corpus, ordered by category and number.
    pub fn all() -> Vec<Sample> {
        SampleCategory::ALL
            .iter()
            .flat_map(|&category| {
                let numbers = list_files_by_number(&category_root(category))
                    .unwrap_or_else(|err| panic!("failed to list samples: {err}"));
                numbers
                    .into_keys()
                    .map(move |number| Sample::new(category, number))
            })
            .collect()
    }
}
