use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use tracing::{debug, info};

use super::RenderError;
use crate::gabc::HEADER_SEPARATOR;

/// Scratch directory for one render. Kept directories outlive the render.
#[derive(Debug)]
enum Workdir {
    Scratch(TempDir),
    Kept(PathBuf),
}

impl Workdir {
    fn path(&self) -> &Path {
        match self {
            Workdir::Scratch(dir) => dir.path(),
            Workdir::Kept(path) => path,
        }
    }
}

/// Output of the first layout phase, consumed by [`NotationEngine::wrap_lines`].
#[derive(Debug)]
pub struct ScoreLayout {
    workdir: Option<Workdir>,
    source: String,
}

impl ScoreLayout {
    /// Layout held entirely in memory, for engines that need no scratch files.
    pub fn in_memory(source: impl Into<String>) -> Self {
        Self {
            workdir: None,
            source: source.into(),
        }
    }

    fn in_dir(workdir: Workdir, source: String) -> Self {
        Self {
            workdir: Some(workdir),
            source,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_ref().map(Workdir::path)
    }
}

/// A score layout engine working in two chained phases: the overall layout,
/// then line wrapping to a target width, which yields the SVG document.
pub trait NotationEngine: Send + Sync {
    fn layout(&self, source: &str) -> Result<ScoreLayout, RenderError>;
    fn wrap_lines(&self, layout: ScoreLayout, width_px: u32) -> Result<String, RenderError>;
}

/// Run both phases. An empty source never reaches the engine.
pub fn render_score(
    engine: &dyn NotationEngine,
    source: &str,
    width_px: u32,
) -> Result<String, RenderError> {
    if source.trim().is_empty() {
        return Err(RenderError::EngineUnavailable("no GABC source".to_string()));
    }
    let layout = engine.layout(source)?;
    engine.wrap_lines(layout, width_px)
}

const GABC_FILE: &str = "chant.gabc";
const GTEX_FILE: &str = "chant.gtex";
const TEX_FILE: &str = "render.tex";
const DVI_FILE: &str = "render.dvi";
const SVG_FILE: &str = "chant.svg";

/// Cropped single-score page; `{width}` is replaced with the text width.
const LATEX_TEMPLATE: &str = r"\documentclass[12pt]{article}
\usepackage{gregoriotex}
\usepackage[active,tightpage]{preview}
\setlength{\textwidth}{{width}pt}
\begin{document}
\begin{preview}
\gregorioscore{chant.gtex}
\end{preview}
\end{document}
";

/// Renders through the GregorioTeX toolchain: `gregorio` compiles the GABC,
/// `lualatex` sets it at the requested width and `dvisvgm` converts the page.
#[derive(Debug, Clone)]
pub struct GregorioEngine {
    gregorio: PathBuf,
    lualatex: PathBuf,
    dvisvgm: PathBuf,
    keep_workdirs: bool,
}

impl Default for GregorioEngine {
    fn default() -> Self {
        Self {
            gregorio: PathBuf::from("gregorio"),
            lualatex: PathBuf::from("lualatex"),
            dvisvgm: PathBuf::from("dvisvgm"),
            keep_workdirs: false,
        }
    }
}

impl GregorioEngine {
    pub fn with_tools(gregorio: PathBuf, lualatex: PathBuf, dvisvgm: PathBuf) -> Self {
        Self {
            gregorio,
            lualatex,
            dvisvgm,
            keep_workdirs: false,
        }
    }

    /// Leave every working directory on disk after the render, for debugging
    /// the TeX toolchain.
    pub fn keep_workdirs(mut self, keep: bool) -> Self {
        self.keep_workdirs = keep;
        self
    }

    fn run(&self, program: &Path, args: &[&str], cwd: &Path) -> Result<Output, RenderError> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => {
                    RenderError::EngineUnavailable(format!("{} not found", program.display()))
                }
                _ => RenderError::Io(err),
            })?;

        if output.status.success() {
            Ok(output)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(RenderError::Layout(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                stderr.trim()
            )))
        }
    }
}

/// gregorio refuses files without a header section.
fn with_header(source: &str) -> String {
    if source.lines().any(|line| line.trim() == HEADER_SEPARATOR) {
        source.to_string()
    } else {
        format!("{HEADER_SEPARATOR}\n{source}")
    }
}

fn text_width_pt(width_px: u32) -> String {
    format!("{:.1}", f64::from(width_px) * 0.75)
}

impl NotationEngine for GregorioEngine {
    fn layout(&self, source: &str) -> Result<ScoreLayout, RenderError> {
        let scratch = tempfile::Builder::new().prefix("chant-render").tempdir()?;
        let workdir = if self.keep_workdirs {
            let path = scratch.into_path();
            info!(dir = %path.display(), "keeping render workdir");
            Workdir::Kept(path)
        } else {
            Workdir::Scratch(scratch)
        };
        fs::write(workdir.path().join(GABC_FILE), with_header(source))?;
        self.run(
            &self.gregorio,
            &["-o", GTEX_FILE, GABC_FILE],
            workdir.path(),
        )?;
        debug!(dir = %workdir.path().display(), "gregorio layout complete");
        Ok(ScoreLayout::in_dir(workdir, source.to_string()))
    }

    fn wrap_lines(&self, layout: ScoreLayout, width_px: u32) -> Result<String, RenderError> {
        let dir = layout
            .workdir()
            .ok_or_else(|| RenderError::Layout("layout has no working directory".to_string()))?;

        let tex = LATEX_TEMPLATE.replace("{width}", &text_width_pt(width_px));
        fs::write(dir.join(TEX_FILE), tex)?;
        self.run(
            &self.lualatex,
            &["--output-format=dvi", "--interaction=batchmode", TEX_FILE],
            dir,
        )?;
        let output_arg = format!("--output={SVG_FILE}");
        self.run(
            &self.dvisvgm,
            &["--no-fonts", "--exact", output_arg.as_str(), DVI_FILE],
            dir,
        )?;

        let svg = fs::read_to_string(dir.join(SVG_FILE))?;
        debug!(bytes = svg.len(), width_px, "score wrapped and converted");
        Ok(svg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoEngine;

    impl NotationEngine for EchoEngine {
        fn layout(&self, source: &str) -> Result<ScoreLayout, RenderError> {
            Ok(ScoreLayout::in_memory(source))
        }

        fn wrap_lines(&self, layout: ScoreLayout, width_px: u32) -> Result<String, RenderError> {
            Ok(format!("<svg width=\"{width_px}\">{}</svg>", layout.source()))
        }
    }

    #[test]
    fn phases_are_chained() {
        let svg = render_score(&EchoEngine, "(c4) A(f)", 640).unwrap();
        assert_eq!(svg, "<svg width=\"640\">(c4) A(f)</svg>");
    }

    #[test]
    fn empty_source_is_unavailable() {
        let err = render_score(&EchoEngine, "  ", 640).unwrap_err();
        assert!(matches!(err, RenderError::EngineUnavailable(_)));
    }

    #[test]
    fn missing_tool_reports_engine_unavailable() {
        let engine = GregorioEngine::with_tools(
            PathBuf::from("/nonexistent/gregorio"),
            PathBuf::from("/nonexistent/lualatex"),
            PathBuf::from("/nonexistent/dvisvgm"),
        );
        let err = render_score(&engine, "(c4) A(f)", 640).unwrap_err();
        assert!(matches!(err, RenderError::EngineUnavailable(_)));
    }

    #[test]
    fn kept_workdir_survives_a_failed_render() {
        let engine = GregorioEngine::with_tools(
            PathBuf::from("/nonexistent/gregorio"),
            PathBuf::from("/nonexistent/lualatex"),
            PathBuf::from("/nonexistent/dvisvgm"),
        );
        let layout = ScoreLayout::in_dir(
            Workdir::Kept(tempfile::tempdir().unwrap().into_path()),
            "(c4) A(f)".to_string(),
        );
        let dir = layout.workdir().unwrap().to_path_buf();
        assert!(engine.wrap_lines(layout, 640).is_err());
        assert!(dir.join(TEX_FILE).exists());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn header_is_added_only_when_missing() {
        assert_eq!(with_header("(c4) A(f)"), "%%\n(c4) A(f)");
        assert_eq!(with_header("name:A;\n%%\n(c4)"), "name:A;\n%%\n(c4)");
    }

    #[test]
    fn template_width_is_substituted() {
        let tex = LATEX_TEMPLATE.replace("{width}", &text_width_pt(800));
        assert!(tex.contains(r"\setlength{\textwidth}{600.0pt}"));
    }
}
