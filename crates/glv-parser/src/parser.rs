//! The stream parser.
//!
//! Lines are read from files or streams and routed to the active scene
//! node. Every file becomes a sub-node named after it; `object_begin`
//! and `object_end` move the active node down and up the tree. While the
//! active node is inside a raw section, each line is forwarded as that
//! section's item command.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use glv_scene::{Dispatch, RawMode, SceneError, SceneNode};

use crate::error::{ParseError, Result};
use crate::event::ViewerEvent;
use crate::settings::ViewerSettings;
use crate::source::{object_name, resolve_include, Input, Line, LineReader};

/// How a parse call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The source was read to its end.
    Finished,
    /// The source has no more data for now; call again later.
    Pending,
    /// An `exit` or `quit` line was read.
    Exit,
}

enum Flow {
    Continue,
    Exit,
}

/// A file being read, for error locations and include resolution.
struct Frame {
    name: String,
    line: usize,
    directory: Option<PathBuf>,
    /// Active-path length right after this file's node was entered.
    depth: usize,
}

/// Builds a scene tree from protocol lines.
pub struct StreamParser {
    root: SceneNode,
    active: Vec<usize>,
    frames: Vec<Frame>,
    settings: ViewerSettings,
    new_data: bool,
    events: Vec<ViewerEvent>,
}

impl StreamParser {
    /// Create a parser with an empty root node.
    pub fn new(settings: ViewerSettings) -> Self {
        Self {
            root: SceneNode::new(""),
            active: Vec::new(),
            frames: vec![Frame {
                name: "stdin".into(),
                line: 0,
                directory: None,
                depth: 0,
            }],
            settings,
            new_data: false,
            events: Vec::new(),
        }
    }

    /// Log errors and keep going instead of stopping at the first one.
    pub fn set_ignore_errors(&mut self, ignore: bool) {
        self.settings.ignore_errors = ignore;
    }

    /// The settings this parser was created with.
    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    /// Root of the scene tree.
    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    /// Mutable root of the scene tree.
    pub fn root_mut(&mut self) -> &mut SceneNode {
        &mut self.root
    }

    /// Consume the parser, keeping the tree.
    pub fn into_root(self) -> SceneNode {
        self.root
    }

    /// Name of the file being read, or `stdin`.
    pub fn current_file(&self) -> &str {
        self.frames.last().map_or("stdin", |f| f.name.as_str())
    }

    /// Line number within [`StreamParser::current_file`].
    pub fn current_line(&self) -> usize {
        self.frames.last().map_or(0, |f| f.line)
    }

    /// True if anything was added since the last call.
    pub fn new_data_parsed(&mut self) -> bool {
        std::mem::take(&mut self.new_data)
    }

    /// Viewer events queued since the last call.
    pub fn take_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read a whole file into a new sub-node of the active node.
    pub fn parse_file(&mut self, path: &Path) -> Result<ParseOutcome> {
        let mut input = match Input::open(path, self.settings.poll_interval()) {
            Ok(input) => input,
            Err(e) => return self.recover(e).map(|_| ParseOutcome::Finished),
        };
        log::info!("Reading : {}", path.display());

        let entered = self.active_node()?.add_command("object_begin", &object_name(path))?;
        let base = self.active.len();
        if let Dispatch::Enter(index) = entered {
            self.active.push(index);
        }
        self.frames.push(Frame {
            name: path.display().to_string(),
            line: 0,
            directory: path.parent().map(Path::to_path_buf),
            depth: self.active.len(),
        });

        let outcome = self.read_stream(&mut input.lines);

        self.close_nodes(base);
        self.frames.pop();
        if let Err(e) = input.finish() {
            log::warn!("{}: {e}", path.display());
        }
        match outcome? {
            ParseOutcome::Exit => Ok(ParseOutcome::Exit),
            _ => Ok(ParseOutcome::Finished),
        }
    }

    /// Parse in-memory text as if it were read from the current stream.
    pub fn parse_str(&mut self, text: &str) -> Result<ParseOutcome> {
        let mut lines = LineReader::new(Cursor::new(text.as_bytes()));
        self.read_stream(&mut lines)
    }

    /// Consume every complete line currently available from `lines`.
    ///
    /// Returns [`ParseOutcome::Pending`] when the source has no data
    /// right now, so an event loop can call again later.
    pub fn read_stream<R: Read>(&mut self, lines: &mut LineReader<R>) -> Result<ParseOutcome> {
        lines.set_max_len(self.settings.max_line_length);
        loop {
            let line = match lines.next_line() {
                Ok(line) => line,
                Err(e) => return Err(self.locate(ParseError::from(e))),
            };
            match line {
                Line::Complete(text) => {
                    if let Some(frame) = self.frames.last_mut() {
                        frame.line += 1;
                    }
                    match self.handle_line(&text) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Exit) => return Ok(ParseOutcome::Exit),
                        Err(e) => self.recover(e)?,
                    }
                }
                Line::TooLong => {
                    if let Some(frame) = self.frames.last_mut() {
                        frame.line += 1;
                    }
                    self.recover(ParseError::LineTooLong)?;
                }
                Line::WouldBlock => return Ok(ParseOutcome::Pending),
                Line::Eof => {
                    if let Err(e) = self.close_raw_at_end() {
                        self.recover(e)?;
                    }
                    return Ok(ParseOutcome::Finished);
                }
            }
        }
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if line.len() >= self.settings.max_line_length {
            return Err(ParseError::LineTooLong);
        }
        let trimmed = line.trim();
        let (command, params) = split_command(trimmed);

        let mode = self.active_node()?.raw_mode();
        if mode != RawMode::NotInRaw {
            if trimmed.is_empty() {
                return Ok(Flow::Continue);
            }
            let node = self.active_node()?;
            if command == "raw_end" || RawMode::from_section(command).is_some() {
                node.add_command(command, params)?;
            } else {
                node.add_command(&mode.item_command(), trimmed)?;
            }
            self.new_data = true;
            return Ok(Flow::Continue);
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(Flow::Continue);
        }

        match command {
            "include" => return self.include(params),
            "title" => {
                self.events.push(ViewerEvent::Title(params.to_string()));
                self.new_data = true;
            }
            "snapshot" => self.events.push(ViewerEvent::snapshot(params)?),
            "view" => {
                self.events.push(ViewerEvent::view(params)?);
                self.new_data = true;
            }
            "exit" | "quit" => {
                if !params.is_empty() {
                    return Err(SceneError::syntax(command, "").into());
                }
                return Ok(Flow::Exit);
            }
            "object_end" if self.active.len() <= self.frame_depth() => {
                return Err(ParseError::invalid(
                    "object_end without a matching object_begin",
                ));
            }
            _ => {
                let dispatch = self.active_node()?.add_command(command, params)?;
                self.new_data = true;
                match dispatch {
                    Dispatch::Continue => {}
                    Dispatch::Enter(index) => self.active.push(index),
                    Dispatch::Leave => {
                        self.active.pop();
                    }
                    Dispatch::Invalidated => self.invalidate_ancestors(),
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn include(&mut self, params: &str) -> Result<Flow> {
        if params.is_empty() {
            return Err(SceneError::syntax("include", "filename").into());
        }
        let directory = self.frames.last().and_then(|f| f.directory.clone());
        let path = resolve_include(params, directory.as_deref());
        if let Ok(target) = path.canonicalize() {
            let open = |f: &Frame| Path::new(&f.name).canonicalize().ok().as_ref() == Some(&target);
            if self.frames.iter().any(open) {
                return Err(ParseError::invalid(format!(
                    "Include cycle : {}",
                    path.display()
                )));
            }
        }
        match self.parse_file(&path)? {
            ParseOutcome::Exit => Ok(Flow::Exit),
            _ => Ok(Flow::Continue),
        }
    }

    fn frame_depth(&self) -> usize {
        self.frames.last().map_or(0, |f| f.depth)
    }

    fn active_node(&mut self) -> Result<&mut SceneNode> {
        self.root
            .descendant_mut(&self.active)
            .ok_or_else(|| ParseError::invalid("The active object no longer exists"))
    }

    /// Drop cached render handles above the active node.
    fn invalidate_ancestors(&mut self) {
        for len in 0..self.active.len() {
            if let Some(node) = self.root.descendant_mut(&self.active[..len]) {
                node.clear_render_handles();
            }
        }
    }

    /// Freeze and leave every node entered past `depth`.
    fn close_nodes(&mut self, depth: usize) {
        while self.active.len() > depth {
            if self.active.len() > depth + 1 {
                log::warn!("{}: object_begin without object_end", self.current_file());
            }
            if let Ok(node) = self.active_node() {
                node.freeze();
            }
            self.active.pop();
        }
    }

    fn close_raw_at_end(&mut self) -> Result<()> {
        let node = self.active_node()?;
        let mode = node.raw_mode();
        if mode == RawMode::NotInRaw {
            return Ok(());
        }
        if let Err(e) = node.add_command("raw_end", "") {
            log::warn!("{e}");
        }
        Err(ParseError::UnterminatedRaw(mode.section().to_string()))
    }

    fn locate(&self, error: ParseError) -> ParseError {
        error.located(self.current_file(), self.current_line())
    }

    /// Locate `error`; log and swallow it in ignore-errors mode.
    fn recover(&mut self, error: ParseError) -> Result<()> {
        let error = self.locate(error);
        if self.settings.ignore_errors {
            log::warn!("{error}");
            Ok(())
        } else {
            Err(error)
        }
    }
}

/// Split a trimmed line into its first word and the trimmed rest.
fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(|c: char| c.is_whitespace()) {
        Some((command, params)) => (command, params.trim()),
        None => (line, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glv_scene::Point3;
    use std::collections::VecDeque;
    use std::fs;
    use std::io;
    use std::time::Duration;

    fn parser() -> StreamParser {
        StreamParser::new(ViewerSettings::default())
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("glv-parser-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("point 1  2 3"), ("point", "1  2 3"));
        assert_eq!(split_command("glend"), ("glend", ""));
        assert_eq!(split_command("text\t0 0 0 f \"a b\""), ("text", "0 0 0 f \"a b\""));
    }

    #[test]
    fn test_commands_reach_root() {
        let mut p = parser();
        let outcome = p.parse_str("# comment\n\npoint 1 2 3\n  line 0 0 0 1 1 1  \n").unwrap();
        assert_eq!(outcome, ParseOutcome::Finished);
        assert_eq!(p.root().stats().primitives, 2);
        assert!(p.new_data_parsed());
        assert!(!p.new_data_parsed());
    }

    #[test]
    fn test_object_blocks_nest() {
        let mut p = parser();
        p.parse_str("object_begin a\nobject_begin b\npoint 0 0 0\nobject_end\nobject_end\npoint 1 1 1\n")
            .unwrap();
        let a = p.root().sub_node(0).unwrap();
        assert!(a.is_frozen());
        assert_eq!(a.sub_node(0).unwrap().name(), "b");
        assert_eq!(p.root().primitive_stores().len(), 1);
    }

    #[test]
    fn test_unmatched_object_end() {
        let mut p = parser();
        let err = p.parse_str("object_end\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parsing error:\nobject_end without a matching object_begin\n[ On line 1 from stdin ]"
        );
        assert!(!p.root().is_frozen());
    }

    #[test]
    fn test_raw_lines_become_items() {
        let mut p = parser();
        p.parse_str("raw_triangle\n0 0 0 1 0 0 0 1 0\n\n  0 0 1 1 0 1 0 1 1  \nraw_end\npoint 5 5 5\n")
            .unwrap();
        assert_eq!(p.root().raw_mode(), RawMode::NotInRaw);
        assert_eq!(p.root().stats().primitives, 3);
    }

    #[test]
    fn test_raw_keywords_are_items_inside_sections() {
        let mut p = parser();
        let err = p.parse_str("raw_point\ninclude other.gl\nraw_end\n").unwrap_err();
        assert!(err.to_string().contains("Syntax error in a \"raw_point\" section"));
        assert!(err.to_string().ends_with("[ On line 2 from stdin ]"));
    }

    #[test]
    fn test_unterminated_raw_section() {
        let mut p = parser();
        let err = p.parse_str("raw_line\n0 0 0 1 1 1\n").unwrap_err();
        assert!(matches!(err.inner(), ParseError::UnterminatedRaw(s) if s == "raw_line"));
        assert_eq!(p.root().raw_mode(), RawMode::NotInRaw);
        assert_eq!(p.root().stats().primitives, 1);
    }

    #[test]
    fn test_stop_on_first_error() {
        let mut p = parser();
        let err = p.parse_str("point 0 0 0\nfrobnicate\npoint 1 1 1\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parsing error:\nUnknown command\n   frobnicate\n[ On line 2 from stdin ]"
        );
        assert_eq!(p.root().stats().primitives, 1);
    }

    #[test]
    fn test_ignore_errors_continues() {
        let mut p = parser();
        p.set_ignore_errors(true);
        p.parse_str("point 0 0 0\npoint 1 1\nraw_point\n1 2 3\nbad item\n4 5 6\nraw_end\n")
            .unwrap();
        assert_eq!(p.root().stats().primitives, 3);
        assert_eq!(p.root().raw_mode(), RawMode::NotInRaw);
    }

    #[test]
    fn test_line_too_long() {
        let mut p = StreamParser::new(ViewerSettings {
            max_line_length: 16,
            ..Default::default()
        });
        let err = p.parse_str("point 1.0000000 2.0000000 3.0000000\n").unwrap_err();
        assert!(matches!(err.inner(), ParseError::LineTooLong));
    }

    #[test]
    fn test_huge_unterminated_line_is_rejected_early() {
        let huge = io::repeat(b'p').take(8 << 20);
        let mut lines = LineReader::new(huge);
        let mut p = parser();
        let err = p.read_stream(&mut lines).unwrap_err();
        assert!(matches!(err.inner(), ParseError::LineTooLong));
        assert_eq!(p.current_line(), 1);
    }

    #[test]
    fn test_long_line_skipped_when_ignoring_errors() {
        let mut p = StreamParser::new(ViewerSettings {
            max_line_length: 16,
            ignore_errors: true,
            ..Default::default()
        });
        let text = format!("point 0 0 0\n{}\npoint 1 1 1\n", "x".repeat(100_000));
        p.parse_str(&text).unwrap();
        assert_eq!(p.root().stats().primitives, 2);
    }

    #[test]
    fn test_exit_stops_parsing() {
        let mut p = parser();
        assert_eq!(p.parse_str("point 0 0 0\nquit\npoint 1 1 1\n").unwrap(), ParseOutcome::Exit);
        assert_eq!(p.root().stats().primitives, 1);
        let err = p.parse_str("exit now\n").unwrap_err();
        assert!(err.to_string().contains("Syntax error in \"exit\""));
    }

    #[test]
    fn test_viewer_events() {
        let mut p = parser();
        p.parse_str("title My scene\nview 0 0 0\nsnapshot 32x32 out.png\n").unwrap();
        let events = p.take_events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], ViewerEvent::Title("My scene".into()));
        assert!(p.take_events().is_empty());
        assert!(p.root().commands().is_empty());
    }

    #[test]
    fn test_execute_object_in_nested_block() {
        let mut p = parser();
        p.parse_str("object_begin outer\nobject_begin inner\npoint 0 0 0\nobject_end\nexecute_object inner\n")
            .unwrap();
        let outer = p.root().sub_node(0).unwrap();
        assert_eq!(outer.commands().len(), 2);
    }

    struct Chunked {
        chunks: VecDeque<&'static str>,
        starved: bool,
    }

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if std::mem::take(&mut self.starved) {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            match self.chunks.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(chunk.as_bytes());
                    self.starved = true;
                    Ok(chunk.len())
                }
                None => Ok(0),
            }
        }
    }

    #[test]
    fn test_partial_line_tolerance() {
        let source = Chunked {
            chunks: VecDeque::from(["point 1 2", " 3\n"]),
            starved: false,
        };
        let mut lines = LineReader::new(source).with_poll_interval(Duration::ZERO);
        let mut p = parser();
        assert_eq!(p.read_stream(&mut lines).unwrap(), ParseOutcome::Pending);
        assert_eq!(p.root_mut().bounding_box().max(), Some(Point3::new(1.0, 2.0, 3.0)));
        assert_eq!(p.read_stream(&mut lines).unwrap(), ParseOutcome::Finished);
    }

    #[test]
    fn test_pending_raw_section_is_not_an_error() {
        let source = Chunked {
            chunks: VecDeque::from(["raw_point\n", "1 2 3\n", "raw_end\n"]),
            starved: false,
        };
        let mut lines = LineReader::new(source);
        let mut p = parser();
        assert_eq!(p.read_stream(&mut lines).unwrap(), ParseOutcome::Pending);
        assert_eq!(p.root().raw_mode(), RawMode::Point);
        assert_eq!(p.read_stream(&mut lines).unwrap(), ParseOutcome::Pending);
        assert_eq!(p.read_stream(&mut lines).unwrap(), ParseOutcome::Pending);
        assert_eq!(p.read_stream(&mut lines).unwrap(), ParseOutcome::Finished);
        assert_eq!(p.root().raw_mode(), RawMode::NotInRaw);
    }

    #[test]
    fn test_files_become_named_nodes() {
        let dir = temp_dir("files");
        fs::create_dir_all(dir.join("parts")).unwrap();
        fs::write(dir.join("scene.gl"), "point 0 0 0\ninclude parts/wheel.gl\n").unwrap();
        fs::write(dir.join("parts/wheel.gl"), "include hub.gl\n").unwrap();
        fs::write(dir.join("parts/hub.gl"), "point 1 1 1\n").unwrap();

        let mut p = parser();
        p.parse_file(&dir.join("scene.gl")).unwrap();
        let scene = p.root().sub_node(0).unwrap();
        assert_eq!(scene.name(), "scene");
        assert!(scene.is_frozen());
        let wheel = scene.sub_node(0).unwrap();
        assert_eq!(wheel.name(), "wheel");
        assert_eq!(wheel.sub_node(0).unwrap().name(), "hub");
        assert_eq!(p.root().stats().primitives, 2);
        assert_eq!(p.current_file(), "stdin");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_include_reports_path() {
        let dir = temp_dir("missing");
        let scene = dir.join("scene.gl");
        fs::write(&scene, "point 0 0 0\ninclude missing.gl\npoint 1 1 1\n").unwrap();

        let mut p = parser();
        let err = p.parse_file(&scene).unwrap_err();
        let text = err.to_string();
        assert!(text.contains(&dir.join("missing.gl").display().to_string()));
        assert!(text.ends_with(&format!("[ On line 2 from {} ]", scene.display())));
        assert_eq!(p.root().stats().primitives, 1);
        assert!(p.root().sub_node(0).unwrap().is_frozen());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_include_cycle_is_rejected() {
        let dir = temp_dir("cycle");
        let scene = dir.join("loop.gl");
        fs::write(&scene, "point 0 0 0\ninclude loop.gl\n").unwrap();

        let mut p = parser();
        let err = p.parse_file(&scene).unwrap_err();
        assert!(err.to_string().contains("Include cycle"));
        assert_eq!(p.root().stats().primitives, 1);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unbalanced_file_is_closed() {
        let dir = temp_dir("unbalanced");
        let scene = dir.join("open.gl");
        fs::write(&scene, "object_begin dangling\npoint 0 0 0\n").unwrap();

        let mut p = parser();
        p.parse_file(&scene).unwrap();
        let file_node = p.root().sub_node(0).unwrap();
        assert!(file_node.sub_node(0).unwrap().is_frozen());
        p.parse_str("point 2 2 2\n").unwrap();
        assert_eq!(p.root().primitive_stores().len(), 1);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_cannot_close_its_own_node() {
        let dir = temp_dir("close");
        let scene = dir.join("extra.gl");
        fs::write(&scene, "object_end\n").unwrap();
        let mut p = parser();
        let err = p.parse_file(&scene).unwrap_err();
        assert!(err.to_string().contains("object_end without a matching object_begin"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
