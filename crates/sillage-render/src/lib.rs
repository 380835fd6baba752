//! Turning recorded call graphs into pictures.
//!
//! A [`GraphSnapshot`] is first laid out as a [`GraphDescription`] (DOT text
//! with one record-shaped node per activation), then handed to a
//! [`GraphRenderer`] that produces image bytes. [`GraphvizRenderer`] pipes the
//! description through an external `dot` process.

use sillage_types::GraphSnapshot;
use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

mod dot;
mod graphviz;
mod table;

pub use dot::GraphDescription;
pub use graphviz::{DOT_ENV, GraphvizRenderer};
pub use table::{TableCell, TableText};

/// Output encodings a renderer can be asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
    Pdf,
    /// The description itself, without layout.
    Dot,
}

impl ImageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
            Self::Dot => "dot",
        }
    }

    /// File extension for saved output.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Dot => "gv",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            "dot" | "gv" => Ok(Self::Dot),
            _ => Err(RenderError::UnknownFormat(s.to_owned())),
        }
    }
}

/// How a call graph is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: ImageFormat,
    /// When false, nodes without a recorded return value drop their `ret`
    /// field instead of showing `ret: ⊥`.
    pub show_null_returns: bool,
    pub dpi: u32,
    pub fontname: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            show_null_returns: true,
            dpi: 100,
            fontname: "helvetica".to_owned(),
        }
    }
}

#[derive(Debug)]
pub enum RenderError {
    /// The renderer process could not be started.
    Spawn { program: PathBuf, source: io::Error },
    Io {
        context: &'static str,
        source: io::Error,
    },
    /// The renderer ran but rejected the description.
    Renderer { status: Option<i32>, stderr: String },
    EmptyOutput { format: ImageFormat },
    UnknownFormat(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { program, source } => {
                write!(f, "failed to start renderer {}: {source}", program.display())
            }
            Self::Io { context, source } => write!(f, "renderer i/o failed while {context}: {source}"),
            Self::Renderer { status, stderr } => {
                match status {
                    Some(code) => write!(f, "renderer exited with status {code}")?,
                    None => write!(f, "renderer was terminated by a signal")?,
                }
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
            Self::EmptyOutput { format } => write!(f, "renderer produced no {format} output"),
            Self::UnknownFormat(name) => {
                write!(f, "unknown image format {name:?}; expected png, svg, pdf or dot")
            }
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn { source, .. } | Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Anything that turns a graph description into encoded image bytes.
pub trait GraphRenderer {
    fn render(
        &self,
        description: &GraphDescription,
        format: ImageFormat,
    ) -> Result<Vec<u8>, RenderError>;
}

/// Lays out `snapshot` and renders it in `options.format`.
///
/// [`ImageFormat::Dot`] returns the description text and never reaches the
/// renderer.
pub fn render_call_graph<R>(
    snapshot: &GraphSnapshot,
    renderer: &R,
    options: &RenderOptions,
) -> Result<Vec<u8>, RenderError>
where
    R: GraphRenderer + ?Sized,
{
    let description = GraphDescription::from_snapshot(snapshot, options);
    if options.format == ImageFormat::Dot {
        return Ok(description.into_bytes());
    }
    let bytes = renderer.render(&description, options.format)?;
    debug!(
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        format = %options.format,
        bytes = bytes.len(),
        "call graph rendered"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sillage_types::{ActivationId, EdgeRecord, NodeRecord, RunId};
    use std::cell::RefCell;

    struct FakeRenderer {
        seen: RefCell<Vec<(String, ImageFormat)>>,
        reply: Vec<u8>,
    }

    impl FakeRenderer {
        fn replying(reply: &[u8]) -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
                reply: reply.to_vec(),
            }
        }
    }

    impl GraphRenderer for FakeRenderer {
        fn render(
            &self,
            description: &GraphDescription,
            format: ImageFormat,
        ) -> Result<Vec<u8>, RenderError> {
            self.seen
                .borrow_mut()
                .push((description.as_str().to_owned(), format));
            Ok(self.reply.clone())
        }
    }

    struct RejectingRenderer;

    impl GraphRenderer for RejectingRenderer {
        fn render(&self, _: &GraphDescription, _: ImageFormat) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Renderer {
                status: Some(1),
                stderr: "syntax error in line 3".to_owned(),
            })
        }
    }

    fn id(raw: u64) -> ActivationId {
        ActivationId::new(raw).expect("test ids are non-zero")
    }

    fn two_node_graph() -> GraphSnapshot {
        GraphSnapshot {
            run: RunId::new(1).expect("run id"),
            nodes: vec![
                NodeRecord {
                    id: id(1),
                    function: "fib".to_owned(),
                    arguments: "1".to_owned(),
                    auxiliary: Vec::new(),
                    return_value: Some("1".to_owned()),
                },
                NodeRecord {
                    id: id(2),
                    function: "fib".to_owned(),
                    arguments: "0".to_owned(),
                    auxiliary: Vec::new(),
                    return_value: Some("0".to_owned()),
                },
            ],
            edges: vec![EdgeRecord {
                src: id(1),
                dst: id(2),
                call_order: 1,
                return_order: Some(1),
            }],
        }
    }

    #[test]
    fn image_formats_parse_case_insensitively() {
        assert_eq!("PNG".parse::<ImageFormat>().expect("png"), ImageFormat::Png);
        assert_eq!(" svg ".parse::<ImageFormat>().expect("svg"), ImageFormat::Svg);
        assert_eq!("gv".parse::<ImageFormat>().expect("gv"), ImageFormat::Dot);
        assert!(matches!(
            "bmp".parse::<ImageFormat>(),
            Err(RenderError::UnknownFormat(name)) if name == "bmp"
        ));
    }

    #[test]
    fn render_call_graph_hands_description_to_renderer() {
        let renderer = FakeRenderer::replying(b"\x89PNG");
        let bytes = render_call_graph(&two_node_graph(), &renderer, &RenderOptions::default())
            .expect("fake renderer succeeds");
        assert_eq!(bytes, b"\x89PNG");

        let seen = renderer.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, ImageFormat::Png);
        assert!(seen[0].0.contains("1 -> 2"), "unexpected dot: {}", seen[0].0);
    }

    #[test]
    fn dot_format_skips_the_renderer() {
        let renderer = FakeRenderer::replying(b"unused");
        let options = RenderOptions {
            format: ImageFormat::Dot,
            ..RenderOptions::default()
        };
        let bytes = render_call_graph(&two_node_graph(), &renderer, &options)
            .expect("dot output needs no renderer");
        let text = String::from_utf8(bytes).expect("dot output is utf-8");
        assert!(text.starts_with("digraph {"));
        assert!(renderer.seen.borrow().is_empty());
    }

    #[test]
    fn renderer_errors_propagate_unchanged() {
        let err = render_call_graph(&two_node_graph(), &RejectingRenderer, &RenderOptions::default())
            .expect_err("rejecting renderer must fail");
        assert!(matches!(
            &err,
            RenderError::Renderer { status: Some(1), stderr } if stderr.contains("line 3")
        ));
        assert_eq!(
            err.to_string(),
            "renderer exited with status 1: syntax error in line 3"
        );
    }
}
