#![warn(missing_docs)]

//! Streaming protocol parser for glv.
//!
//! [`StreamParser`] reads newline-delimited scene commands from files,
//! pipes or in-memory text and builds a [`glv_scene::SceneNode`] tree.
//! Compressed files are decoded transparently, `include` lines pull in
//! other files relative to the including one, and viewer directives
//! (`title`, `view`, `snapshot`) are queued as [`ViewerEvent`]s.
//!
//! ```no_run
//! use glv_parser::{StreamParser, ViewerSettings};
//!
//! let mut parser = StreamParser::new(ViewerSettings::default());
//! parser.parse_file("scene.gl".as_ref())?;
//! let stats = parser.root().stats();
//! println!("{} primitives", stats.primitives);
//! # Ok::<(), glv_parser::ParseError>(())
//! ```

pub mod error;
pub mod event;
pub mod parser;
pub mod settings;
pub mod source;

pub use error::{ParseError, Result};
pub use event::{View, ViewerEvent};
pub use parser::{ParseOutcome, StreamParser};
pub use settings::ViewerSettings;
pub use source::{Compression, Input, Line, LineReader};
