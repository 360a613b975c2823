////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! An extension loader generator for Khronos API registries (`gl.xml`, `egl.xml`).
//!
//! For every extension supporting the target API it emits, in document order:
//!
//! - an include-guarded block of `PFN...PROC` function pointer typedefs and
//!   `#define` constants for the header,
//! - a `have_<EXTENSION>` flag and one `func_<command>` pointer per command not
//!   seen before for the `struct extensions` capability table.
//!
//! # Example
//!
//! ```no_run
//! use glapi_generator::{Api, ExtensionLoaderGenerator, Registry};
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let registry = Registry::from_xml(BufReader::new(File::open("gl.xml").unwrap())).unwrap();
//! let mut header = Vec::new();
//! let mut table = Vec::new();
//!
//! registry
//!     .write_loaders(ExtensionLoaderGenerator::new(Api::Gles2), &mut header, &mut table)
//!     .unwrap();
//! ```
//!
//! The generated header does not define the base types (`GLenum`, `GL_APIENTRY`,
//! ...); it starts with a per-API preamble including the stock headers instead.

#[macro_use]
extern crate log;
extern crate xml;

#[cfg(feature = "unstable_generator_utils")]
pub mod generators;
#[cfg(not(feature = "unstable_generator_utils"))]
mod generators;

mod error;
mod registry;

use std::io;

pub use error::{Error, ItemKind, Result};
pub use generators::{
    extension_loader_gen::{process_extension, EmissionState, ExtensionLoaderGenerator, ExtensionOutput, Loaders},
    Generator,
};

pub use registry::*;

/// Generates loader declarations for `api`, writing them to `header` and the
/// capability table to `body`.
///
/// Either both sinks are written or, on error, neither is.
pub fn generate_loaders<H, B>(registry: &Registry, api: Api, header: &mut H, body: &mut B) -> Result<()>
where
    H: io::Write,
    B: io::Write,
{
    registry.write_loaders(ExtensionLoaderGenerator::new(api), header, body)
}
