use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure inside a single provider. The dispatcher logs it and treats the
/// provider as having contributed nothing.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("malformed desktop entry {path:?}: {reason}")]
    DesktopEntry { path: PathBuf, reason: String },
    #[error("not an arithmetic expression: {0}")]
    Calc(#[from] CalcError),
    #[error("cannot query {path:?}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token after expression")]
    TrailingInput,
    #[error("unknown identifier {0:?}")]
    UnknownIdent(String),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("result is not a finite number")]
    NotFinite,
    #[error("expression nested too deeply")]
    TooDeep,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid ranking: {0}")]
    InvalidRanking(String),
    #[error("invalid application exclude pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history io: {0}")]
    Io(#[from] io::Error),
    #[error("history format: {0}")]
    Json(#[from] serde_json::Error),
}
