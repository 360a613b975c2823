////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::{fmt, io};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// The kind of registry item a lookup was made for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Command,
    Enum,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ItemKind::Command => write!(fmt, "command"),
            ItemKind::Enum => write!(fmt, "enum"),
        }
    }
}

/// Everything that can abort a generation run. None of these are recoverable.
#[derive(Debug, Error)]
pub enum Error {
    /// The document is not a registry or lacks one of its required sections.
    #[error("malformed registry: {0}")]
    MalformedRegistry(String),

    /// A required command or enum is missing. Enums that exist but carry no
    /// value are reported the same way.
    #[error("could not find {kind}: {name}")]
    NotFound { kind: ItemKind, name: String },

    #[error("unknown api: {0}")]
    UnknownApi(String),

    #[error("xml: {0}")]
    Xml(#[from] xml::reader::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn command_not_found(name: &str) -> Error {
        Error::NotFound { kind: ItemKind::Command, name: name.to_owned() }
    }

    pub fn enum_not_found(name: &str) -> Error {
        Error::NotFound { kind: ItemKind::Enum, name: name.to_owned() }
    }

    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Error {
        Error::MalformedRegistry(msg.into())
    }
}
