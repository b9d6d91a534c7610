//! Safe Rust façade over the Info-ZIP zip and unzip engines
//!
//! The engines are native libraries (`zip32` / `unzip32`) driven through a callback
//! oriented C interface. This crate assembles their option blocks, supplies the callback
//! trampolines, and turns their status codes into [`Result`]s. Engine notifications are
//! delivered to a listener passed into each operation.
//!
//! # Examples
//!
//! ## Creating an archive
//!
//! ```no_run
//! use infozip::{ServiceNotification, WriteListener, ZipWriter};
//!
//! struct Progress;
//!
//! impl WriteListener for Progress {
//!     fn on_print(&mut self, message: &str) {
//!         println!("{}", message);
//!     }
//!
//!     fn on_service(&mut self, member: &ServiceNotification) {
//!         println!("{} ({} bytes)", member.name(), member.size());
//!     }
//! }
//!
//! let writer = ZipWriter::new("test.zip")
//!     .password("password")
//!     .comment("This is just a test archive");
//!
//! writer.add_files(&["*.jpg"], &mut Progress)?;
//! # Ok::<(), infozip::Error>(())
//! ```
//!
//! ## Extracting an archive
//!
//! ```no_run
//! use infozip::ZipReader;
//!
//! let reader = ZipReader::new("test.zip")
//!     .password("password")
//!     .output_folder("out");
//!
//! reader.extract_archive(&mut ())?;
//! # Ok::<(), infozip::Error>(())
//! ```

#![deny(missing_docs)]

mod callbacks;
mod codec;
mod error;
mod events;
mod library;
mod options;
mod reader;
mod status;
mod writer;

pub use error::{Error, Result};
pub use events::{ExtractListener, ServiceNotification, WriteListener};
pub use infozip_sys::{UnzipLibrary, ZipLibrary};
pub use options::{
    CompressionLevel, ExtractOptions, OverwritePolicy, PathMode, PrivilegeMode, QuietLevel,
    Recurse, Repair, WriteMode, WriteOptions,
};
pub use reader::ZipReader;
pub use status::{ReplaceDecision, UnzipStatus, ZipStatus};
pub use writer::ZipWriter;
