use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::{GraphDescription, GraphRenderer, ImageFormat, RenderError};

/// Overrides the renderer executable.
pub const DOT_ENV: &str = "SILLAGE_DOT";

/// Renders through an external Graphviz `dot` process.
#[derive(Debug, Clone)]
pub struct GraphvizRenderer {
    program: PathBuf,
}

impl Default for GraphvizRenderer {
    fn default() -> Self {
        Self::from_env()
    }
}

impl GraphvizRenderer {
    /// Uses `$SILLAGE_DOT` when set, `dot` from `PATH` otherwise.
    pub fn from_env() -> Self {
        match std::env::var_os(DOT_ENV) {
            Some(program) if !program.is_empty() => Self::with_program(program),
            _ => Self::with_program("dot"),
        }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl GraphRenderer for GraphvizRenderer {
    fn render(
        &self,
        description: &GraphDescription,
        format: ImageFormat,
    ) -> Result<Vec<u8>, RenderError> {
        let mut child = Command::new(&self.program)
            .arg(format!("-T{}", format.as_str()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(description.as_str().as_bytes()) {
                Ok(()) => {}
                // The exit status and stderr say more than the broken pipe.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(source) => {
                    return Err(RenderError::Io {
                        context: "writing the graph description",
                        source,
                    });
                }
            }
        }

        let output = child.wait_with_output().map_err(|source| RenderError::Io {
            context: "waiting for the renderer",
            source,
        })?;
        if !output.status.success() {
            return Err(RenderError::Renderer {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        if output.stdout.is_empty() {
            return Err(RenderError::EmptyOutput { format });
        }
        debug!(
            program = %self.program.display(),
            %format,
            bytes = output.stdout.len(),
            "renderer finished"
        );
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RenderOptions;
    use sillage_types::{GraphSnapshot, RunId};

    fn empty_description() -> GraphDescription {
        let snapshot = GraphSnapshot {
            run: RunId::new(1).expect("run id"),
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        GraphDescription::from_snapshot(&snapshot, &RenderOptions::default())
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let renderer = GraphvizRenderer::with_program("/nonexistent/sillage-test-dot");
        let err = renderer
            .render(&empty_description(), ImageFormat::Png)
            .expect_err("missing program must fail");
        assert!(matches!(err, RenderError::Spawn { .. }), "got {err}");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_reports_its_status() {
        let renderer = GraphvizRenderer::with_program("false");
        let err = renderer
            .render(&empty_description(), ImageFormat::Svg)
            .expect_err("false must fail");
        assert!(
            matches!(err, RenderError::Renderer { status: Some(1), .. }),
            "got {err}"
        );
    }

    #[cfg(unix)]
    #[test]
    fn silent_program_is_empty_output() {
        let renderer = GraphvizRenderer::with_program("true");
        let err = renderer
            .render(&empty_description(), ImageFormat::Pdf)
            .expect_err("true writes nothing");
        assert!(matches!(
            err,
            RenderError::EmptyOutput {
                format: ImageFormat::Pdf
            }
        ));
    }
}
